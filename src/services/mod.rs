//! # Services
//!
//! The collaborators the HTTP layer talks to, behind traits, plus the
//! in-process backends the development server runs on.
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- axum handlers
//! ├─────────────────┤
//! │  Service Layer  │  <-- CatalogService / AccountService / FileStorage
//! ├─────────────────┤
//! │     Backend     │  <-- MemoryCatalog / AuthService / MemoryStorage
//! └─────────────────┘
//! ```

mod auth_service;
mod catalog;
mod storage;

pub use auth_service::*;
pub use catalog::*;
pub use storage::*;

use std::sync::Arc;

use crate::config::Config;

// =====================================
// Application State
// =====================================
/// Shared by every handler; cloning only bumps the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub catalog: Arc<dyn CatalogService>,

    pub accounts: Arc<dyn AccountService>,

    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// State backed by the in-process services
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        Self {
            catalog: Arc::new(MemoryCatalog::new()),
            accounts: Arc::new(AuthService::new(config.clone())),
            storage: Arc::new(MemoryStorage::new(config.clone())),
            config,
        }
    }

    #[must_use]
    pub fn with_services(
        config: Arc<Config>,
        catalog: Arc<dyn CatalogService>,
        accounts: Arc<dyn AccountService>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            config,
            catalog,
            accounts,
            storage,
        }
    }

    /// Host used in every generated href
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.config.backend_domain
    }
}

// =====================================
// Service Trait
// =====================================
/// Every service is shared across request tasks
pub trait Service: Send + Sync {}
