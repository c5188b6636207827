//! Business logic services

pub mod catalog;

use std::sync::Arc;

use crate::repository::ItemStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services on top of the given item store
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(store),
        }
    }
}
