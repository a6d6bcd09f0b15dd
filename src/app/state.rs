use std::path::PathBuf;

use ratatui::layout::Rect;
use tui_input::Input;

use crate::command::ActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing a name for saving the current signature.
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: String,
    pub level: StatusLevel,
    pub last_action_id: Option<ActionId>,
}

impl StatusState {
    pub fn info(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.set(StatusLevel::Info, String::new());
    }

    fn set(&mut self, level: StatusLevel, message: impl Into<String>) {
        self.level = level;
        self.message = message.into();
    }
}

/// What the viewer currently shows, used to map mouse clicks back to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerGeometry {
    /// Cells the preview image occupies.
    pub image_area: Rect,
    pub preview_width_px: u32,
    pub preview_height_px: u32,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: Mode,
    pub status: StatusState,
    pub prompt: Input,
    pub output_path: PathBuf,
    pub preview_size_px: Option<(u32, u32)>,
    pub viewer: Option<ViewerGeometry>,
}

impl AppState {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            mode: Mode::Normal,
            status: StatusState::default(),
            prompt: Input::default(),
            output_path,
            preview_size_px: None,
            viewer: None,
        }
    }
}
