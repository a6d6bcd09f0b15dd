//! Single-user signing workflow: one PDF, one signature, one placement.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{PagePreview, PdfBackend, PdfDoc};
use crate::config::SignatureConfig;
use crate::error::{AppError, AppResult};
use crate::overlay::{Compositor, OverlayRequest, SignedPdf};
use crate::placement::{Placement, Position};
use crate::signature::SignatureImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Idle,
    PdfLoaded,
    SignatureReady,
    PositionChosen,
    Exported,
}

/// Why an export request did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportBlocker {
    MissingPdf,
    MissingSignature,
    MissingPosition,
}

impl ExportBlocker {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingPdf => "load a PDF before exporting",
            Self::MissingSignature => "choose or draw a signature before exporting",
            Self::MissingPosition => "place the signature on the page before exporting",
        }
    }
}

impl fmt::Display for ExportBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug)]
pub enum ExportOutcome {
    Exported(SignedPdf),
    Blocked(ExportBlocker),
}

struct LoadedPdf {
    doc: PdfDoc,
    bytes: Arc<Vec<u8>>,
}

pub struct SigningSession {
    settings: SignatureConfig,
    compositor: Compositor,
    pdf: Option<LoadedPdf>,
    page: usize,
    signature: Option<SignatureImage>,
    position: Option<Position>,
    width: u32,
    exported: bool,
}

impl SigningSession {
    pub fn new(settings: SignatureConfig) -> Self {
        let width = settings.clamp_width(settings.default_width);
        Self {
            settings,
            compositor: Compositor::new(),
            pdf: None,
            page: 0,
            signature: None,
            position: None,
            width,
            exported: false,
        }
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn stage(&self) -> SessionStage {
        if self.exported {
            return SessionStage::Exported;
        }
        match (&self.pdf, &self.signature, &self.position) {
            (None, _, _) => SessionStage::Idle,
            (Some(_), None, _) => SessionStage::PdfLoaded,
            (Some(_), Some(_), None) => SessionStage::SignatureReady,
            (Some(_), Some(_), Some(_)) => SessionStage::PositionChosen,
        }
    }

    pub fn open_pdf(&mut self, path: impl AsRef<Path>) -> AppResult<usize> {
        let path = path.as_ref();
        let bytes = PdfDoc::load_shared_bytes(path)?;
        self.load_pdf(path, bytes)
    }

    /// Replaces the current document; `name` only labels it.
    pub fn load_pdf(&mut self, name: impl AsRef<Path>, bytes: Arc<Vec<u8>>) -> AppResult<usize> {
        let doc = PdfDoc::open_with_shared_bytes(name, Arc::clone(&bytes))?;
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(AppError::invalid_argument("pdf has no pages"));
        }

        tracing::info!(path = %doc.path().display(), page_count, "loaded pdf");
        self.pdf = Some(LoadedPdf { doc, bytes });
        self.page = 0;
        self.position = None;
        self.exported = false;
        Ok(page_count)
    }

    pub fn pdf_path(&self) -> Option<&Path> {
        self.pdf.as_ref().map(|loaded| loaded.doc.path())
    }

    pub fn doc_id(&self) -> Option<u64> {
        self.pdf.as_ref().map(|loaded| loaded.doc.doc_id())
    }

    pub fn page_count(&self) -> usize {
        self.pdf
            .as_ref()
            .map_or(0, |loaded| loaded.doc.page_count())
    }

    /// Current 0-based page.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Selecting a different page drops the position, which was page-relative.
    pub fn set_page(&mut self, page: usize) -> AppResult<()> {
        let page_count = self.page_count();
        if self.pdf.is_none() {
            return Err(AppError::invalid_argument("no pdf loaded"));
        }
        if page >= page_count {
            return Err(AppError::invalid_argument(format!(
                "page {} is out of range (document has {page_count} pages)",
                page + 1
            )));
        }
        if page != self.page {
            tracing::debug!(from = self.page, to = page, "changed page");
            self.page = page;
            self.position = None;
            self.exported = false;
        }
        Ok(())
    }

    pub fn signature(&self) -> Option<&SignatureImage> {
        self.signature.as_ref()
    }

    pub fn set_signature(&mut self, signature: SignatureImage) {
        let size = signature.size();
        tracing::debug!(width = size.width, height = size.height, "signature selected");
        self.signature = Some(signature);
        self.exported = false;
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn set_position(&mut self, position: Position) -> AppResult<()> {
        if self.pdf.is_none() {
            return Err(AppError::invalid_argument(
                "load a PDF before choosing a position",
            ));
        }
        self.position = Some(position);
        self.exported = false;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Sets the signature width in points, clamped to the configured range.
    pub fn set_width(&mut self, width: u32) -> u32 {
        self.width = self.settings.clamp_width(width);
        self.exported = false;
        self.width
    }

    /// Grows or shrinks the width by whole configured steps.
    pub fn step_width(&mut self, steps: i32) -> u32 {
        let delta = i64::from(self.settings.width_step) * i64::from(steps);
        let width = (i64::from(self.width) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        self.set_width(width)
    }

    pub fn placement(&self) -> Option<Placement> {
        self.position.map(|position| Placement {
            position,
            width: self.width,
        })
    }

    pub fn render_preview(&self, zoom: f32) -> AppResult<PagePreview> {
        let loaded = self
            .pdf
            .as_ref()
            .ok_or_else(|| AppError::invalid_argument("no pdf loaded"))?;
        loaded.doc.render_preview(self.page, zoom)
    }

    pub fn blocker(&self) -> Option<ExportBlocker> {
        if self.pdf.is_none() {
            Some(ExportBlocker::MissingPdf)
        } else if self.signature.is_none() {
            Some(ExportBlocker::MissingSignature)
        } else if self.position.is_none() {
            Some(ExportBlocker::MissingPosition)
        } else {
            None
        }
    }

    /// Flattens the signature into the current page.
    ///
    /// Missing inputs are reported as [`ExportOutcome::Blocked`]; only failures
    /// while building the output are errors.
    pub fn export(&mut self) -> AppResult<ExportOutcome> {
        let (Some(loaded), Some(signature), Some(placement)) =
            (self.pdf.as_ref(), self.signature.as_ref(), self.placement())
        else {
            let blocker = self.blocker().unwrap_or(ExportBlocker::MissingPdf);
            tracing::warn!(%blocker, "export blocked");
            return Ok(ExportOutcome::Blocked(blocker));
        };

        let signed = self.compositor.sign(
            &loaded.bytes,
            &OverlayRequest {
                page: self.page,
                signature,
                placement,
            },
        )?;
        self.exported = true;
        Ok(ExportOutcome::Exported(signed))
    }

    /// Default output path: `<stem>_signed.pdf` beside the loaded file.
    pub fn default_output_path(&self) -> Option<PathBuf> {
        let path = self.pdf_path()?;
        let name = path.file_name()?.to_string_lossy();
        Some(path.with_file_name(signed_file_name(&name)))
    }
}

/// `report.pdf` becomes `report_signed.pdf`; names without a `.pdf`
/// extension get the suffix appended as-is.
pub fn signed_file_name(original: &str) -> String {
    let stem = original
        .len()
        .checked_sub(4)
        .filter(|&split| original.is_char_boundary(split))
        .filter(|&split| original[split..].eq_ignore_ascii_case(".pdf"))
        .map_or(original, |split| &original[..split]);
    format!("{stem}_signed.pdf")
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use lopdf::Document;

    use crate::config::SignatureConfig;
    use crate::overlay::Compositor;
    use crate::placement::Position;
    use crate::signature::SignatureImage;
    use crate::test_support::{
        TestPage, build_pdf, build_pdf_with_pages, sample_signature, unique_temp_path,
    };

    use super::{ExportBlocker, ExportOutcome, SessionStage, SigningSession, signed_file_name};

    fn signature() -> SignatureImage {
        SignatureImage::from_rgba(sample_signature(60, 20)).expect("signature should build")
    }

    fn session_with_pdf(pages: &[&str]) -> SigningSession {
        let mut session = SigningSession::new(SignatureConfig::default());
        session
            .load_pdf("contract.pdf", Arc::new(build_pdf(pages)))
            .expect("pdf should load");
        session
    }

    fn blocked_by(session: &mut SigningSession) -> Option<ExportBlocker> {
        match session.export().expect("export should not error") {
            ExportOutcome::Blocked(blocker) => Some(blocker),
            ExportOutcome::Exported(_) => None,
        }
    }

    #[test]
    fn click_at_preview_center_exports_at_displayed_center() {
        let pages = [
            TestPage::new(300, 300, "cropped").with_entries("/CropBox [0 0 150 300]"),
            TestPage::new(600, 300, "turned").with_entries("/Rotate 90"),
        ];
        let mut session = SigningSession::new(SignatureConfig::default());
        session
            .load_pdf("boxes.pdf", Arc::new(build_pdf_with_pages(&pages)))
            .expect("pdf should load");
        session.set_signature(signature());

        for page in 0..2 {
            session.set_page(page).expect("page should exist");
            let preview = session.render_preview(1.5).expect("preview should render");
            session
                .set_position(Position::Click {
                    x_px: f64::from(preview.frame.width) / 2.0,
                    y_px: f64::from(preview.frame.height) / 2.0,
                    preview_width_px: preview.frame.width,
                    preview_height_px: preview.frame.height,
                })
                .expect("position should be accepted");

            let ExportOutcome::Exported(signed) = session.export().expect("export should run")
            else {
                panic!("export should not be blocked");
            };
            let center = signed.rect.center();
            assert!((center.x - f64::from(preview.page_width_pt) / 2.0).abs() < 0.5);
            assert!((center.y - f64::from(preview.page_height_pt) / 2.0).abs() < 0.5);
        }
    }

    #[test]
    fn export_is_blocked_until_every_input_is_set() {
        let mut session = SigningSession::new(SignatureConfig::default());
        assert_eq!(session.stage(), SessionStage::Idle);
        assert_eq!(blocked_by(&mut session), Some(ExportBlocker::MissingPdf));

        session
            .load_pdf("contract.pdf", Arc::new(build_pdf(&["a", "b"])))
            .expect("pdf should load");
        assert_eq!(session.stage(), SessionStage::PdfLoaded);
        assert_eq!(blocked_by(&mut session), Some(ExportBlocker::MissingSignature));

        session.set_signature(signature());
        assert_eq!(session.stage(), SessionStage::SignatureReady);
        assert_eq!(blocked_by(&mut session), Some(ExportBlocker::MissingPosition));

        session
            .set_position(Position::CENTER)
            .expect("position should be accepted");
        assert_eq!(session.stage(), SessionStage::PositionChosen);

        let ExportOutcome::Exported(signed) = session.export().expect("export should run") else {
            panic!("export should not be blocked");
        };
        assert_eq!(session.stage(), SessionStage::Exported);
        assert_eq!(signed.page_count, 2);
        let output = Document::load_mem(&signed.bytes).expect("output should parse");
        assert_eq!(output.get_pages().len(), 2);
    }

    #[test]
    fn changing_page_or_pdf_resets_position() {
        let mut session = session_with_pdf(&["a", "b", "c"]);
        session.set_signature(signature());
        session
            .set_position(Position::CENTER)
            .expect("position should be accepted");

        session.set_page(0).expect("same page is fine");
        assert!(session.position().is_some());

        session.set_page(2).expect("page 3 exists");
        assert_eq!(session.page(), 2);
        assert!(session.position().is_none());
        assert_eq!(session.stage(), SessionStage::SignatureReady);

        session
            .set_position(Position::CENTER)
            .expect("position should be accepted");
        session
            .load_pdf("other.pdf", Arc::new(build_pdf(&["x"])))
            .expect("pdf should load");
        assert_eq!(session.page(), 0);
        assert!(session.position().is_none());
        assert!(session.signature().is_some());
    }

    #[test]
    fn set_page_rejects_out_of_range() {
        let mut session = session_with_pdf(&["a"]);
        assert!(session.set_page(1).is_err());

        let mut empty = SigningSession::new(SignatureConfig::default());
        assert!(empty.set_page(0).is_err());
        assert!(empty.set_position(Position::CENTER).is_err());
    }

    #[test]
    fn width_is_clamped_and_stepped() {
        let mut session = SigningSession::new(SignatureConfig::default());
        assert_eq!(session.width(), 150);
        assert_eq!(session.set_width(10), 50);
        assert_eq!(session.set_width(1000), 400);
        assert_eq!(session.step_width(-3), 370);
        assert_eq!(session.step_width(10), 400);
    }

    #[test]
    fn export_failure_leaves_session_unexported() {
        let staging = unique_temp_path("session_staging");
        fs::create_dir_all(&staging).expect("staging dir should be created");
        let mut session = session_with_pdf(&["a"])
            .with_compositor(Compositor::with_temp_dir(staging.join("missing")));
        session.set_signature(signature());
        session
            .set_position(Position::CENTER)
            .expect("position should be accepted");

        assert!(session.export().is_err());
        assert_eq!(session.stage(), SessionStage::PositionChosen);

        fs::remove_dir_all(&staging).expect("staging dir should be removed");
    }

    #[test]
    fn signed_file_name_strips_pdf_extension_case_insensitively() {
        assert_eq!(signed_file_name("report.pdf"), "report_signed.pdf");
        assert_eq!(signed_file_name("REPORT.PDF"), "REPORT_signed.pdf");
        assert_eq!(signed_file_name("archive.tar"), "archive.tar_signed.pdf");
        assert_eq!(signed_file_name("pdf"), "pdf_signed.pdf");
    }

    #[test]
    fn default_output_path_sits_beside_input() {
        let session = session_with_pdf(&["a"]);
        assert_eq!(
            session.default_output_path(),
            Some(PathBuf::from("contract_signed.pdf"))
        );
    }
}
