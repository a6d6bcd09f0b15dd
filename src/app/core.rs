use std::path::PathBuf;

use crate::config::Config;
use crate::error::AppResult;
use crate::presenter::{ImagePresenter, PresenterKind, create_presenter};
use crate::session::SigningSession;
use crate::signature::SignatureStore;

use super::preview_cache::PreviewCache;
use super::state::AppState;

/// Interactive placement screen around one [`SigningSession`].
pub struct App {
    pub state: AppState,
    pub session: SigningSession,
    pub config: Config,
    pub(crate) presenter: Box<dyn ImagePresenter>,
    pub(crate) previews: PreviewCache,
    store: Option<SignatureStore>,
}

impl App {
    pub fn new(session: SigningSession, output_path: PathBuf, config: Config) -> AppResult<Self> {
        let presenter = create_presenter(PresenterKind::RatatuiImage)?;
        Ok(Self::with_presenter(session, output_path, config, presenter))
    }

    pub fn with_presenter(
        session: SigningSession,
        output_path: PathBuf,
        config: Config,
        presenter: Box<dyn ImagePresenter>,
    ) -> Self {
        let previews = PreviewCache::new(config.preview.cache_entries);
        Self {
            state: AppState::new(output_path),
            session,
            config,
            presenter,
            previews,
            store: None,
        }
    }

    /// Opens the saved-signature folder on first use.
    pub(crate) fn store(&mut self) -> AppResult<&SignatureStore> {
        let store = match self.store.take() {
            Some(store) => store,
            None => SignatureStore::open(self.config.signatures.resolved_directory()?)?,
        };
        Ok(&*self.store.insert(store))
    }
}
