mod factory;
mod ratatui;
mod traits;

pub use factory::create_presenter;
pub use ratatui::RatatuiImagePresenter;
pub use traits::{ImagePresenter, PresenterKind};
