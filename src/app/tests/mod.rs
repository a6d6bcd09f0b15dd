
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use image::RgbaImage;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::App;
use crate::config::Config;
use crate::error::AppResult;
use crate::presenter::ImagePresenter;
use crate::session::SigningSession;
use crate::signature::SignatureImage;
use crate::test_support::{build_pdf, sample_signature};

/// Keeps the last prepared image and claims the whole area when rendering.
#[derive(Default, Clone)]
struct RecordingPresenter {
    prepared: Rc<RefCell<Vec<RgbaImage>>>,
}

impl ImagePresenter for RecordingPresenter {
    fn status_label(&self) -> String {
        "recording".to_string()
    }

    fn prepare(&mut self, image: RgbaImage) -> AppResult<()> {
        self.prepared.borrow_mut().push(image);
        Ok(())
    }

    fn render(&mut self, _frame: &mut Frame<'_>, area: Rect) -> AppResult<Option<Rect>> {
        Ok((!self.prepared.borrow().is_empty()).then_some(area))
    }
}

struct TestApp {
    app: App,
    prepared: Rc<RefCell<Vec<RgbaImage>>>,
}

fn test_app(pages: &[&str], with_signature: bool, output_path: PathBuf) -> TestApp {
    let mut config = Config::default();
    config.preview.zoom = 1.0;
    test_app_with_config(pages, with_signature, output_path, config)
}

fn test_app_with_config(
    pages: &[&str],
    with_signature: bool,
    output_path: PathBuf,
    config: Config,
) -> TestApp {
    let mut session = SigningSession::new(config.signature.clone());
    session
        .load_pdf("contract.pdf", Arc::new(build_pdf(pages)))
        .expect("pdf should load");
    if with_signature {
        session.set_signature(
            SignatureImage::from_rgba(sample_signature(60, 20)).expect("signature should build"),
        );
    }

    let presenter = RecordingPresenter::default();
    let prepared = Rc::clone(&presenter.prepared);
    let mut app = App::with_presenter(session, output_path, config, Box::new(presenter));
    app.refresh_preview();
    TestApp { app, prepared }
}
