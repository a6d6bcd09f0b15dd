use image::RgbaImage;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterKind {
    RatatuiImage,
}

pub trait ImagePresenter {
    fn initialize_terminal(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn status_label(&self) -> String;

    /// Replaces the image shown by the next `render`.
    fn prepare(&mut self, image: RgbaImage) -> AppResult<()>;

    /// Draws the prepared image fitted into `area`.
    ///
    /// Returns the cells actually covered, or `None` when nothing is prepared.
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect) -> AppResult<Option<Rect>>;
}
