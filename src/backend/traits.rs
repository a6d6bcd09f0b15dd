use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl RgbaFrame {
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels_to_vec(&self) -> Vec<u8> {
        self.pixels.as_ref().to_vec()
    }

    pub fn to_rgba_image(&self) -> AppResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels_to_vec()).ok_or(
            AppError::invalid_argument("rgba frame pixels length does not match dimensions"),
        )
    }
}

/// A rasterized page together with the page's size in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePreview {
    pub page: usize,
    pub frame: RgbaFrame,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

impl PagePreview {
    /// Points per preview pixel along x.
    pub fn scale_x(&self) -> f64 {
        f64::from(self.page_width_pt) / f64::from(self.frame.width.max(1))
    }

    /// Points per preview pixel along y.
    pub fn scale_y(&self) -> f64 {
        f64::from(self.page_height_pt) / f64::from(self.frame.height.max(1))
    }
}

pub trait PdfBackend: Send {
    fn path(&self) -> &Path;
    fn doc_id(&self) -> u64;
    fn page_count(&self) -> usize;
    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)>;
    fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbaFrame>;

    fn render_preview(&self, page: usize, zoom: f32) -> AppResult<PagePreview> {
        let (page_width_pt, page_height_pt) = self.page_dimensions(page)?;
        let frame = self.render_page(page, zoom)?;
        tracing::debug!(
            page,
            zoom,
            width = frame.width,
            height = frame.height,
            "rendered page preview"
        );
        Ok(PagePreview {
            page,
            frame,
            page_width_pt,
            page_height_pt,
        })
    }
}
