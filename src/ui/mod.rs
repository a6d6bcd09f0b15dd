mod chrome;
mod layout;
mod overlay;

pub use chrome::{HELP_TEXT, StatusView, draw_chrome, stage_label, status_text};
pub use layout::{UiLayout, split_layout};
pub use overlay::{draw_name_prompt, draw_notice_overlay};
