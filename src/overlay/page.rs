use kurbo::Rect;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{AppError, AppResult};
use crate::placement::PageSize;

/// Bound on `/Parent` hops when resolving inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// A page's media box as `[llx, lly, urx, ury]` in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub(crate) llx: f32,
    pub(crate) lly: f32,
    pub(crate) urx: f32,
    pub(crate) ury: f32,
}

impl MediaBox {
    pub(crate) const LETTER: Self = Self {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    pub(crate) fn width(&self) -> f32 {
        (self.urx - self.llx).abs()
    }

    pub(crate) fn height(&self) -> f32 {
        (self.ury - self.lly).abs()
    }

    pub(crate) fn as_array(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.llx),
            Object::Real(self.lly),
            Object::Real(self.urx),
            Object::Real(self.ury),
        ])
    }
}

pub(crate) fn page_dict(doc: &Document, page_id: ObjectId) -> AppResult<&Dictionary> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|source| AppError::pdf_parse(format!("page {page_id:?} is not a dictionary"), source))
}

/// Looks up `key` on the page, falling back to its ancestors in the page tree.
pub(crate) fn inherited_attribute(
    doc: &Document,
    page_id: ObjectId,
    key: &[u8],
) -> AppResult<Option<Object>> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        if depth > MAX_INHERIT_DEPTH {
            return Err(AppError::pdf_structure("page tree is too deep or cyclic"));
        }
        let dict = page_dict(doc, id)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value.clone()));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    Ok(None)
}

pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> AppResult<MediaBox> {
    Ok(page_box(doc, page_id, b"MediaBox")?.unwrap_or(MediaBox::LETTER))
}

/// The part of a page a viewer shows, and how it is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageFrame {
    /// Crop box clipped to the media box, in user space.
    pub(crate) visible: MediaBox,
    /// Clockwise quarter turns in degrees: 0, 90, 180 or 270.
    pub(crate) rotation: u16,
}

impl PageFrame {
    /// Size of the page as displayed, which is what previews are rendered at.
    pub(crate) fn display_size(&self) -> PageSize {
        let (width, height) = (
            f64::from(self.visible.width()),
            f64::from(self.visible.height()),
        );
        match self.rotation {
            90 | 270 => PageSize::new(height, width),
            _ => PageSize::new(width, height),
        }
    }

    /// `cm` operands that paint an image upright into `rect`, which is given in
    /// displayed-page points with the origin at the displayed bottom-left.
    pub(crate) fn image_matrix(&self, rect: Rect) -> [f64; 6] {
        let width = f64::from(self.visible.width());
        let height = f64::from(self.visible.height());
        let (ox, oy) = (f64::from(self.visible.llx), f64::from(self.visible.lly));
        let (rw, rh) = (rect.width(), rect.height());
        match self.rotation {
            90 => [0.0, rw, -rh, 0.0, ox + width - rect.y0, oy + rect.x0],
            180 => [-rw, 0.0, 0.0, -rh, ox + width - rect.x0, oy + height - rect.y0],
            270 => [0.0, -rw, rh, 0.0, ox + rect.y0, oy + height - rect.x0],
            _ => [rw, 0.0, 0.0, rh, ox + rect.x0, oy + rect.y0],
        }
    }
}

pub(crate) fn page_frame(doc: &Document, page_id: ObjectId) -> AppResult<PageFrame> {
    let media = media_box(doc, page_id)?;
    let visible = match page_box(doc, page_id, b"CropBox")? {
        Some(crop) => {
            let clipped = MediaBox {
                llx: crop.llx.max(media.llx),
                lly: crop.lly.max(media.lly),
                urx: crop.urx.min(media.urx),
                ury: crop.ury.min(media.ury),
            };
            if clipped.urx > clipped.llx && clipped.ury > clipped.lly {
                clipped
            } else {
                media
            }
        }
        None => media,
    };

    let rotation = match inherited_attribute(doc, page_id, b"Rotate")? {
        Some(raw) => resolve(doc, &raw)?
            .as_i64()
            .ok()
            .map(|degrees| degrees.rem_euclid(360))
            .filter(|degrees| degrees % 90 == 0)
            .and_then(|degrees| u16::try_from(degrees).ok())
            .unwrap_or(0),
        None => 0,
    };
    Ok(PageFrame { visible, rotation })
}

fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> AppResult<Option<MediaBox>> {
    let name = String::from_utf8_lossy(key);
    let Some(raw) = inherited_attribute(doc, page_id, key)? else {
        return Ok(None);
    };
    let resolved = resolve(doc, &raw)?;
    let values = resolved
        .as_array()
        .map_err(|source| AppError::pdf_parse(format!("{name} is not an array"), source))?;
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|value| resolve(doc, value).ok().and_then(obj_to_f32))
        .collect();
    let &[llx, lly, urx, ury] = numbers.as_slice() else {
        return Err(AppError::pdf_structure(format!(
            "{name} must hold four numbers"
        )));
    };

    let page_box = MediaBox {
        llx: llx.min(urx),
        lly: lly.min(ury),
        urx: llx.max(urx),
        ury: lly.max(ury),
    };
    if page_box.width() <= 0.0 || page_box.height() <= 0.0 {
        return Err(AppError::pdf_structure(format!("{name} has zero area")));
    }
    Ok(Some(page_box))
}

/// Resolves one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> AppResult<&'a Object> {
    match object {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|source| AppError::pdf_parse(format!("dangling reference {id:?}"), source)),
        other => Ok(other),
    }
}

/// Returns an owned copy of a direct or referenced dictionary.
pub(crate) fn owned_dict(doc: &Document, object: &Object) -> AppResult<Dictionary> {
    resolve(doc, object)?
        .as_dict()
        .cloned()
        .map_err(|source| AppError::pdf_parse("expected a dictionary", source))
}

/// Content stream references of a page, flattening an indirect array.
pub(crate) fn content_parts(doc: &Document, page_id: ObjectId) -> AppResult<Vec<Object>> {
    let dict = page_dict(doc, page_id)?;
    let Ok(contents) = dict.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match contents {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(id) => match resolve(doc, contents)? {
            Object::Array(items) => Ok(items.clone()),
            Object::Stream(_) => Ok(vec![Object::Reference(*id)]),
            _ => Err(AppError::pdf_structure("page Contents is not a stream")),
        },
        _ => Err(AppError::pdf_structure("page Contents is not a stream")),
    }
}

fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}
