//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::db::CatalogStore;
use crate::services::CatalogService;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CatalogConfig,
    catalog: CatalogService,
}

impl AppState {
    /// Build state around an already-connected store.
    #[must_use]
    pub fn new(config: CatalogConfig, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: CatalogService::new(store),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}
