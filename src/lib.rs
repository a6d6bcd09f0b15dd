pub mod app;
pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub(crate) mod event;
pub mod input;
pub mod overlay;
pub mod placement;
pub mod presenter;
pub mod session;
pub mod signature;
pub mod ui;

#[cfg(test)]
mod test_support;
