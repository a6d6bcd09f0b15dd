//! Mapping between preview pixels, page percentages and PDF point space.
//!
//! PDF user space has its origin at the bottom-left of the media box, while
//! preview images have theirs at the top-left. Every placement resolves to a
//! point that the signature is centered on; the resulting rectangle is then
//! clamped so it never leaves the page.

use kurbo::{Point, Rect};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(self) -> AppResult<Self> {
        if !self.width.is_finite()
            || !self.height.is_finite()
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(AppError::invalid_argument(
                "page size must be positive and finite",
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Pixel on the rendered preview, origin top-left.
    Click {
        x_px: f64,
        y_px: f64,
        preview_width_px: u32,
        preview_height_px: u32,
    },
    /// Horizontal and vertical position in percent of the page, 0-100.
    Percent { x: f64, y: f64 },
}

impl Position {
    pub const CENTER: Self = Self::Percent { x: 50.0, y: 50.0 };

    /// The same location as page percentages, each within 0-100.
    pub fn to_percent(self) -> (f64, f64) {
        match self {
            Self::Click {
                x_px,
                y_px,
                preview_width_px,
                preview_height_px,
            } => {
                if preview_width_px == 0 || preview_height_px == 0 {
                    return (50.0, 50.0);
                }
                (
                    (x_px / f64::from(preview_width_px) * 100.0).clamp(0.0, 100.0),
                    (y_px / f64::from(preview_height_px) * 100.0).clamp(0.0, 100.0),
                )
            }
            Self::Percent { x, y } => (x.clamp(0.0, 100.0), y.clamp(0.0, 100.0)),
        }
    }

    /// Moves by percentage points, staying on the page.
    pub fn nudged(self, dx: f64, dy: f64) -> Self {
        let (x, y) = self.to_percent();
        Self::Percent {
            x: (x + dx).clamp(0.0, 100.0),
            y: (y + dy).clamp(0.0, 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Position,
    /// Signature width in points.
    pub width: u32,
}

/// Signature size in points for a chosen width, keeping the image's aspect ratio.
pub fn target_size(width: u32, image: ImageSize) -> AppResult<(u32, u32)> {
    if image.width == 0 || image.height == 0 {
        return Err(AppError::invalid_argument(
            "signature image must not be empty",
        ));
    }
    let width = width.max(1);
    let height = (f64::from(width) * f64::from(image.height) / f64::from(image.width)).round();
    Ok((width, (height as u32).max(1)))
}

/// Point in PDF space the signature is centered on.
pub fn anchor_point(page: PageSize, position: Position) -> AppResult<Point> {
    let page = page.validate()?;
    match position {
        Position::Click {
            x_px,
            y_px,
            preview_width_px,
            preview_height_px,
        } => {
            if preview_width_px == 0 || preview_height_px == 0 {
                return Err(AppError::invalid_argument(
                    "preview size must be non-zero",
                ));
            }
            if !x_px.is_finite() || !y_px.is_finite() {
                return Err(AppError::invalid_argument(
                    "click position must be finite",
                ));
            }
            let scale_x = page.width / f64::from(preview_width_px);
            let scale_y = page.height / f64::from(preview_height_px);
            Ok(Point::new(x_px * scale_x, page.height - y_px * scale_y))
        }
        Position::Percent { x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return Err(AppError::invalid_argument(
                    "percent position must be finite",
                ));
            }
            let x = x.clamp(0.0, 100.0) / 100.0;
            let y = y.clamp(0.0, 100.0) / 100.0;
            Ok(Point::new(x * page.width, page.height - y * page.height))
        }
    }
}

/// Rectangle the signature occupies in PDF point space.
pub fn signature_rect(page: PageSize, image: ImageSize, placement: Placement) -> AppResult<Rect> {
    let page = page.validate()?;
    let (width, height) = target_size(placement.width, image)?;
    let (width, height) = (f64::from(width), f64::from(height));
    let center = anchor_point(page, placement.position)?;

    let x0 = clamp_origin(center.x - width / 2.0, width, page.width);
    let y0 = clamp_origin(center.y - height / 2.0, height, page.height);
    Ok(Rect::new(x0, y0, x0 + width, y0 + height))
}

/// Maps a PDF-space rectangle onto preview pixels (origin top-left).
pub fn rect_to_preview(
    rect: Rect,
    page: PageSize,
    preview_width_px: u32,
    preview_height_px: u32,
) -> AppResult<Rect> {
    let page = page.validate()?;
    let px_per_pt_x = f64::from(preview_width_px) / page.width;
    let px_per_pt_y = f64::from(preview_height_px) / page.height;
    Ok(Rect::new(
        rect.x0 * px_per_pt_x,
        (page.height - rect.y1) * px_per_pt_y,
        rect.x1 * px_per_pt_x,
        (page.height - rect.y0) * px_per_pt_y,
    ))
}

fn clamp_origin(origin: f64, extent: f64, limit: f64) -> f64 {
    origin.clamp(0.0, (limit - extent).max(0.0))
}
