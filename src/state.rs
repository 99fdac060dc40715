use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::Semaphore;

use crate::{catalog::Catalog, config::Config, sandbox::Sandbox, store::SharedStore, tutor::TutorClient};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub catalog: Arc<Catalog>,
    pub sandbox: Arc<Sandbox>,
    /// Bounds how many sandbox worker processes are alive at once.
    pub sandbox_permits: Arc<Semaphore>,
    pub tutor: Option<Arc<dyn TutorClient>>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: SharedStore,
        catalog: Catalog,
        sandbox: Sandbox,
        tutor: Option<Arc<dyn TutorClient>>,
    ) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            sandbox: Arc::new(sandbox),
            sandbox_permits: Arc::new(Semaphore::new(config.sandbox_max_concurrency.max(1))),
            tutor,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
