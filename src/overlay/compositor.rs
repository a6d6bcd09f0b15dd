use std::io::Write;
use std::path::PathBuf;

use kurbo::Rect;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tempfile::NamedTempFile;

use crate::error::{AppError, AppResult};
use crate::placement::{PageSize, Placement, signature_rect};
use crate::signature::SignatureImage;

use super::page::{content_parts, inherited_attribute, media_box, owned_dict, page_frame};
use super::xobject::{embed_rgba_image, overlay_form};

const OVERLAY_NAME: &str = "PsigOverlay";

#[derive(Debug, Clone, Copy)]
pub struct OverlayRequest<'a> {
    /// 0-based page index.
    pub page: usize,
    pub signature: &'a SignatureImage,
    pub placement: Placement,
}

#[derive(Debug, Clone)]
pub struct SignedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Where the signature landed on the page as displayed (crop box with
    /// `/Rotate` applied), in points from the bottom-left corner.
    pub rect: Rect,
}

/// Flattens a signature onto one page of a PDF.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    temp_dir: Option<PathBuf>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages signature PNGs in `dir` instead of the system temp directory.
    pub fn with_temp_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    pub fn sign(&self, source: &[u8], request: &OverlayRequest<'_>) -> AppResult<SignedPdf> {
        // Dropping the staged file removes it on every path out of this function.
        let staged = self.stage_signature(request.signature)?;
        let normalized = image::open(staged.path())
            .map_err(|source| AppError::image(source, "failed to read staged signature"))?
            .to_rgba8();

        let mut doc = Document::load_mem(source)
            .map_err(|source| AppError::pdf_parse("failed to load PDF", source))?;
        let pages = doc.get_pages();
        let page_count = pages.len();
        let page_id = u32::try_from(request.page + 1)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or_else(|| {
                AppError::invalid_argument(format!(
                    "page {} is out of range (document has {page_count} pages)",
                    request.page + 1
                ))
            })?;

        // Positions are relative to the page as previewed, so they map through
        // the crop box and rotation rather than the raw media box.
        let media_box = media_box(&doc, page_id)?;
        let frame = page_frame(&doc, page_id)?;
        let rect = signature_rect(
            frame.display_size(),
            request.signature.size(),
            request.placement,
        )?;

        let image_id = embed_rgba_image(&mut doc, &normalized)?;
        let form_id = overlay_form(&mut doc, media_box, image_id, frame.image_matrix(rect))?;
        merge_overlay(&mut doc, page_id, form_id)?;
        drop(staged);

        let mut bytes = Vec::new();
        write_document(&mut doc, &mut bytes)?;
        tracing::info!(
            page = request.page,
            page_count,
            rotation = frame.rotation,
            x = rect.x0,
            y = rect.y0,
            width = rect.width(),
            height = rect.height(),
            "flattened signature onto page"
        );

        Ok(SignedPdf {
            bytes,
            page_count,
            rect,
        })
    }

    fn stage_signature(&self, signature: &SignatureImage) -> AppResult<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("psig-signature-").suffix(".png");
        let staged = match self.temp_dir.as_ref() {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| AppError::io_with_context(source, "failed to create staging file"))?;

        signature.save_png(staged.path())?;
        tracing::debug!(path = %staged.path().display(), "staged signature image");
        Ok(staged)
    }
}

/// Paints the form over the page's existing content.
///
/// The original content is bracketed by `q`/`Q` so its graphics state cannot
/// move the overlay. Resources are copied onto the page so pages sharing or
/// inheriting them are left untouched.
fn merge_overlay(doc: &mut Document, page_id: ObjectId, form_id: ObjectId) -> AppResult<()> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources")? {
        Some(raw) => owned_dict(doc, &raw)?,
        None => Dictionary::new(),
    };
    let mut xobjects = match resources.get(b"XObject") {
        Ok(raw) => owned_dict(doc, raw)?,
        Err(_) => Dictionary::new(),
    };
    let overlay_name = unused_name(&xobjects, OVERLAY_NAME);
    xobjects.set(overlay_name.as_str(), form_id);
    resources.set("XObject", Object::Dictionary(xobjects));

    let existing = content_parts(doc, page_id)?;
    let paint = format!("q /{overlay_name} Do Q\n");
    let contents = if existing.is_empty() {
        vec![Object::Reference(add_content_stream(doc, paint.into_bytes()))]
    } else {
        let open = add_content_stream(doc, b"q\n".to_vec());
        let close = add_content_stream(doc, format!("\nQ\n{paint}").into_bytes());
        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
        contents
    };

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|source| AppError::pdf_parse("page is not a dictionary", source))?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

fn write_document(doc: &mut Document, target: &mut impl Write) -> AppResult<()> {
    doc.save_to(target)
        .map_err(|source| AppError::pdf_write("failed to serialize signed pdf", source))
}

fn add_content_stream(doc: &mut Document, content: Vec<u8>) -> ObjectId {
    doc.add_object(Stream::new(Dictionary::new(), content))
}

fn unused_name(dict: &Dictionary, base: &str) -> String {
    if !dict.has(base.as_bytes()) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}{suffix}"))
        .find(|candidate| !dict.has(candidate.as_bytes()))
        .unwrap_or_else(|| base.to_string())
}

/// Media box sizes of every page, in page order.
pub fn page_sizes(source: &[u8]) -> AppResult<Vec<PageSize>> {
    let doc = Document::load_mem(source)
        .map_err(|source| AppError::pdf_parse("failed to load PDF", source))?;
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let media_box = media_box(&doc, page_id)?;
            Ok(PageSize::new(
                f64::from(media_box.width()),
                f64::from(media_box.height()),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Write};

    use lopdf::{Document, Object};

    use crate::error::AppError;
    use crate::placement::{PageSize, Placement, Position};
    use crate::signature::SignatureImage;
    use crate::test_support::{
        TestPage, build_pdf, build_pdf_with_pages, sample_signature, unique_temp_path,
    };

    use super::{Compositor, OVERLAY_NAME, OverlayRequest, page_sizes, write_document};

    fn centered(width: u32) -> Placement {
        Placement {
            position: Position::Percent { x: 50.0, y: 50.0 },
            width,
        }
    }

    fn page_snapshot(doc: &Document, page_number: u32) -> (String, Vec<u8>) {
        let page_id = *doc.get_pages().get(&page_number).expect("page should exist");
        let dict = doc.get_object(page_id).expect("page object should exist");
        let content = doc
            .get_page_content(page_id)
            .expect("page content should decode");
        (format!("{dict:?}"), content)
    }

    fn overlay_content(doc: &Document, page_number: u32) -> String {
        let page_id = *doc.get_pages().get(&page_number).expect("page should exist");
        let form = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict)
            .and_then(|resources| resources.get(b"XObject"))
            .and_then(Object::as_dict)
            .and_then(|xobjects| xobjects.get(OVERLAY_NAME.as_bytes()))
            .and_then(Object::as_reference)
            .and_then(|form_id| doc.get_object(form_id))
            .and_then(Object::as_stream)
            .expect("page should reference the overlay form");
        let bytes = if form.dict.has(b"Filter") {
            form.decompressed_content().expect("form should decompress")
        } else {
            form.content.clone()
        };
        String::from_utf8(bytes).expect("form content should be text")
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sign_keeps_page_count_and_untouched_pages_identical() {
        let source = build_pdf(&["one", "two", "three"]);
        let signature =
            SignatureImage::from_rgba(sample_signature(90, 30)).expect("signature should build");
        let original = Document::load_mem(&source).expect("source should load");

        for target in 0..3_usize {
            let signed = Compositor::new()
                .sign(
                    &source,
                    &OverlayRequest {
                        page: target,
                        signature: &signature,
                        placement: centered(150),
                    },
                )
                .expect("sign should succeed");
            assert_eq!(signed.page_count, 3);

            let output = Document::load_mem(&signed.bytes).expect("output should load");
            assert_eq!(output.get_pages().len(), 3);
            for page_number in 1..=3_u32 {
                let before = page_snapshot(&original, page_number);
                let after = page_snapshot(&output, page_number);
                if page_number as usize == target + 1 {
                    assert_ne!(before, after, "target page {page_number} should change");
                } else {
                    assert_eq!(before, after, "page {page_number} should be unchanged");
                }
            }
        }
    }

    #[test]
    fn shared_resources_object_is_not_mutated() {
        let source = build_pdf(&["one", "two"]);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 0,
                    signature: &signature,
                    placement: centered(100),
                },
            )
            .expect("sign should succeed");

        let output = Document::load_mem(&signed.bytes).expect("output should load");
        let shared = output
            .get_object((3, 0))
            .and_then(Object::as_dict)
            .expect("shared resources should survive");
        assert!(!shared.has(b"XObject"));

        let page_id = *output.get_pages().get(&1).expect("page 1");
        let resources = output
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict)
            .expect("target page should carry its own resources");
        assert!(resources.has(b"Font"));
        let xobjects = resources
            .get(b"XObject")
            .and_then(Object::as_dict)
            .expect("target page should have XObjects");
        assert!(xobjects.has(b"PsigOverlay"));
    }

    #[test]
    fn overlay_is_painted_after_original_content() {
        let source = build_pdf(&["hello"]);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 0,
                    signature: &signature,
                    placement: centered(100),
                },
            )
            .expect("sign should succeed");

        let output = Document::load_mem(&signed.bytes).expect("output should load");
        let page_id = *output.get_pages().get(&1).expect("page 1");
        let content = output.get_page_content(page_id).expect("content should decode");
        let text = String::from_utf8_lossy(&content);
        let original_at = text.find("Tj").expect("original text stays");
        let overlay_at = text.find("/PsigOverlay Do").expect("overlay is painted");
        assert!(text.trim_start().starts_with('q'));
        assert!(original_at < overlay_at);
    }

    #[test]
    fn signature_rect_uses_target_page_media_box() {
        let source = build_pdf_with_pages(&[
            TestPage::new(612, 792, "letter"),
            TestPage::new(400, 200, "small"),
        ]);
        let signature =
            SignatureImage::from_rgba(sample_signature(200, 100)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 1,
                    signature: &signature,
                    placement: centered(100),
                },
            )
            .expect("sign should succeed");

        let center = signed.rect.center();
        assert!((center.x - 200.0).abs() < 1e-9);
        assert!((center.y - 100.0).abs() < 1e-9);
        assert_eq!(signed.rect.height(), 50.0);
    }

    #[test]
    fn click_on_cropped_page_lands_under_the_click() {
        // Visible area is x 100..250 of a 300x300 media box, previewed at 1.5x.
        let source = build_pdf_with_pages(&[
            TestPage::new(300, 300, "cropped").with_entries("/CropBox [100 0 250 300]")
        ]);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 0,
                    signature: &signature,
                    placement: Placement {
                        position: Position::Click {
                            x_px: 112.5,
                            y_px: 225.0,
                            preview_width_px: 225,
                            preview_height_px: 450,
                        },
                        width: 100,
                    },
                },
            )
            .expect("sign should succeed");

        let center = signed.rect.center();
        assert!((center.x - 75.0).abs() < 1e-9);
        assert!((center.y - 150.0).abs() < 1e-9);

        let output = Document::load_mem(&signed.bytes).expect("output should load");
        assert_eq!(
            overlay_content(&output, 1),
            "q 100 0 0 50 125 125 cm /PsigImage Do Q"
        );
    }

    #[test]
    fn rotated_page_gets_signature_upright_where_it_is_displayed() {
        // A 600x300 page turned a quarter clockwise displays as 300x600.
        let source = build_pdf_with_pages(&[
            TestPage::new(600, 300, "turned").with_entries("/Rotate 90")
        ]);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 0,
                    signature: &signature,
                    placement: Placement {
                        position: Position::Percent { x: 20.0, y: 10.0 },
                        width: 100,
                    },
                },
            )
            .expect("sign should succeed");

        assert!((signed.rect.x0 - 10.0).abs() < 1e-9);
        assert!((signed.rect.y0 - 515.0).abs() < 1e-9);
        let output = Document::load_mem(&signed.bytes).expect("output should load");
        assert_eq!(
            overlay_content(&output, 1),
            "q 0 100 -50 0 85 10 cm /PsigImage Do Q"
        );
    }

    #[test]
    fn embedded_signature_is_flate_compressed() {
        let source = build_pdf(&["page"]);
        let signature =
            SignatureImage::from_rgba(sample_signature(600, 200)).expect("signature should build");

        let signed = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 0,
                    signature: &signature,
                    placement: centered(150),
                },
            )
            .expect("sign should succeed");
        assert!(signed.bytes.len() < 600 * 200 * 3 / 10);

        let output = Document::load_mem(&signed.bytes).expect("output should load");
        let image = output
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .find(|stream| {
                stream.dict.get(b"Width").and_then(Object::as_i64).ok() == Some(600)
                    && stream.dict.has(b"SMask")
            })
            .expect("signature image should be embedded");
        assert_eq!(
            image.dict.get(b"Filter").and_then(Object::as_name).ok(),
            Some(&b"FlateDecode"[..])
        );
    }

    #[test]
    fn serialization_failure_is_a_write_error() {
        let mut doc = Document::load_mem(&build_pdf(&["page"])).expect("pdf should load");

        let err = write_document(&mut doc, &mut FailingWriter).expect_err("writer refuses bytes");
        assert!(matches!(err, AppError::PdfWrite { .. }));
        assert!(err.to_string().contains("failed to serialize signed pdf"));
    }

    #[test]
    fn page_sizes_follow_page_order() {
        let source = build_pdf_with_pages(&[
            TestPage::new(595, 842, "a4"),
            TestPage::new(400, 200, "wide"),
        ]);

        let sizes = page_sizes(&source).expect("sizes should resolve");
        assert_eq!(
            sizes,
            vec![PageSize::new(595.0, 842.0), PageSize::new(400.0, 200.0)]
        );
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let source = build_pdf(&["only"]);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");

        let err = Compositor::new()
            .sign(
                &source,
                &OverlayRequest {
                    page: 4,
                    signature: &signature,
                    placement: centered(100),
                },
            )
            .expect_err("page 5 does not exist");
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn staged_signature_is_removed_on_success_and_failure() {
        let staging = unique_temp_path("staging");
        fs::create_dir_all(&staging).expect("staging dir should be created");
        let compositor = Compositor::with_temp_dir(&staging);
        let signature =
            SignatureImage::from_rgba(sample_signature(20, 10)).expect("signature should build");
        let request = OverlayRequest {
            page: 0,
            signature: &signature,
            placement: centered(100),
        };

        compositor
            .sign(&build_pdf(&["ok"]), &request)
            .expect("sign should succeed");
        assert_eq!(fs::read_dir(&staging).expect("readable").count(), 0);

        let err = compositor
            .sign(b"%PDF-1.4\nthis is not a pdf", &request)
            .expect_err("corrupt pdf should fail");
        assert!(matches!(err, AppError::PdfParse { .. }));
        assert_eq!(fs::read_dir(&staging).expect("readable").count(), 0);

        fs::remove_dir_all(&staging).expect("staging dir should be removed");
    }
}
