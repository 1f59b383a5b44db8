//! Application state management

use std::sync::Arc;

use crate::annotations::{AnnotationStore, KeyValueStore};
use crate::config::Config;
use crate::service::AnnotationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: AnnotationStore,
    service: AnnotationService,
}

impl AppState {
    /// Build the state over a storage backend
    ///
    /// Starts the store's writer task, so this must run inside a Tokio runtime.
    pub fn new(config: &Config, backend: Arc<dyn KeyValueStore>) -> Self {
        let store = AnnotationStore::with_config(backend, config.store_config());
        let service = AnnotationService::new(store.clone());

        Self {
            inner: Arc::new(AppStateInner { store, service }),
        }
    }

    /// Get the annotation store
    pub fn store(&self) -> &AnnotationStore {
        &self.inner.store
    }

    /// Get the message service
    pub fn service(&self) -> &AnnotationService {
        &self.inner.service
    }
}
