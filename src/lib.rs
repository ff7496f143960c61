//! # KiwiScript API
//!
//! HTTP layer of an e-learning platform: languages contain series,
//! series contain sections, sections contain lessons, and each lesson can
//! carry an article, a video and downloadable files. Responses are
//! HAL-style JSON with `_links` and `_embedded` blocks.
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── lib.rs          # module tree, re-exports
//! ├── main.rs         # development server
//! ├── config/         # settings from the environment
//! ├── error/          # AppError and its JSON rendering
//! ├── models/         # records, representation builders, request shapes
//! ├── routes.rs       # the route table
//! ├── api/            # router, extractors, middleware, handlers
//! ├── services/       # collaborator traits and in-memory backends
//! └── utils/          # validators and small helpers
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use kiwiscript_api::{api::create_router, config::Config, services::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!     axum::serve(listener, create_router(AppState::new(config))).await?;
//!     Ok(())
//! }
//! ```

pub mod config;

pub mod error;

/// Domain records, HAL representations and request bodies
pub mod models;

pub mod routes;

/// Collaborators behind traits, plus the in-process backends
pub mod services;

pub mod api;

pub mod utils;

// =====================================
// Re-exports
// =====================================
pub use error::{AppError, Result};

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
