//! # Models
//!
//! Domain records handed over by the services, and the request and
//! response shapes built from them.
//!
//! ```text
//! records ──► <resource>::XxxResponse::from_record(domain, &record)
//!                   │
//!                   └─► links::ResourcePath ──► https://{domain}/api/v1/...
//! ```

pub mod auth;
pub mod certificate;
pub mod dto;
pub mod language;
pub mod lesson;
pub mod links;
pub mod pagination;
pub mod records;
pub mod section;
pub mod series;
pub mod user;

pub use auth::*;
pub use certificate::*;
pub use dto::*;
pub use language::*;
pub use lesson::*;
pub use links::{LinkResponse, ResourcePath, SelfLinkResponse};
pub use pagination::*;
pub use records::*;
pub use section::*;
pub use series::*;
pub use user::*;
