use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use hayro::hayro_syntax::page::Page;
use hayro::vello_cpu::color::palette::css::WHITE;
use hayro::{RenderSettings, render};

use crate::error::{AppError, AppResult};

use super::traits::{PdfBackend, RgbaFrame};

pub struct PdfDoc {
    path: PathBuf,
    doc_id: u64,
    pdf: Pdf,
}

impl PdfBackend for PdfDoc {
    fn path(&self) -> &Path {
        PdfDoc::path(self)
    }

    fn doc_id(&self) -> u64 {
        PdfDoc::doc_id(self)
    }

    fn page_count(&self) -> usize {
        PdfDoc::page_count(self)
    }

    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        PdfDoc::page_render_dimensions(self, page)
    }

    fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbaFrame> {
        PdfDoc::render_page(self, page, scale)
    }
}

impl PdfDoc {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = Self::load_shared_bytes(path)?;
        Self::open_with_shared_bytes(path, bytes)
    }

    pub fn load_shared_bytes(path: impl AsRef<Path>) -> AppResult<Arc<Vec<u8>>> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AppError::invalid_argument("pdf path must not be empty"));
        }
        if !path.exists() {
            return Err(AppError::io_with_context(
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing file"),
                format!("pdf file not found: {}", path.display()),
            ));
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(
                "pdf path must be a regular file",
            ));
        }

        let bytes = std::fs::read(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read pdf: {}", path.display()))
        })?;
        ensure_pdf_header(&bytes)?;
        Ok(Arc::new(bytes))
    }

    /// Opens an in-memory document; `path` only labels it.
    pub fn open_with_shared_bytes(path: impl AsRef<Path>, bytes: Arc<Vec<u8>>) -> AppResult<Self> {
        let path = path.as_ref();
        ensure_pdf_header(&bytes)?;
        let doc_id = calculate_doc_id(path, &bytes);
        let pdf = Pdf::new(bytes)
            .map_err(|_| AppError::invalid_argument("failed to parse PDF with hayro"))?;

        Ok(Self {
            path: path.to_path_buf(),
            doc_id,
            pdf,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn doc_id(&self) -> u64 {
        self.doc_id
    }

    pub fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    pub fn page_render_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        Ok(self.page_ref(page)?.render_dimensions())
    }

    pub fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbaFrame> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::invalid_argument(
                "scale must be a positive finite value",
            ));
        }
        let page_ref = self.page_ref(page)?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            bg_color: WHITE,
            ..Default::default()
        };
        let interpreter_settings = InterpreterSettings::default();
        let pixmap = render(page_ref, &interpreter_settings, &render_settings);

        let frame = RgbaFrame {
            width: pixmap.width() as u32,
            height: pixmap.height() as u32,
            pixels: pixmap.data_as_u8_slice().to_vec().into(),
        };
        if frame.width == 0 || frame.height == 0 {
            return Err(AppError::pdf_render(
                page,
                AppError::unsupported("page rendered to an empty pixmap"),
            ));
        }
        Ok(frame)
    }

    fn page_ref(&self, page: usize) -> AppResult<&Page<'_>> {
        self.pdf
            .pages()
            .get(page)
            .ok_or(AppError::invalid_argument("page index is out of range"))
    }
}

fn ensure_pdf_header(bytes: &[u8]) -> AppResult<()> {
    if bytes.starts_with(b"%PDF-") {
        Ok(())
    } else {
        Err(AppError::invalid_argument(
            "input is not a valid PDF header",
        ))
    }
}

fn calculate_doc_id(path: &Path, bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    bytes.len().hash(&mut hasher);
    bytes[..bytes.len().min(4096)].hash(&mut hasher);
    hasher.finish()
}
