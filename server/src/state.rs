use std::sync::Arc;

use crate::repository::ResourceStore;
use crate::services::calendar::WindowResolver;
use crate::services::query::EventQueryEngine;

/// Shared handler state. The store is opened once at startup and injected
/// here.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ResourceStore>,
    resolver: WindowResolver,
}

impl AppState {
    pub fn new(store: Arc<dyn ResourceStore>, resolver: WindowResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &dyn ResourceStore {
        self.store.as_ref()
    }

    pub fn resolver(&self) -> &WindowResolver {
        &self.resolver
    }

    pub fn event_query(&self) -> EventQueryEngine<'_, dyn ResourceStore> {
        EventQueryEngine::new(self.store.as_ref())
    }
}
