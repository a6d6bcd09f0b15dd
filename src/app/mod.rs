mod command_ops;
mod core;
mod event_bus;
mod event_loop;
mod preview_cache;
mod state;
pub(crate) mod terminal_session;
mod view_ops;

#[cfg(test)]
mod tests;

pub use core::App;
pub use preview_cache::{CacheCounters, PreviewCache, PreviewKey};
pub use state::{AppState, Mode, StatusLevel, StatusState, ViewerGeometry};
