//! # API Layer
//!
//! Turns the route table in [`crate::routes`] into an axum [`Router`]
//! mounted under `/api`, with guards as route layers and the shared
//! middleware stack around everything.
//!
//! Layer order, outermost first:
//!
//! 1. tower-http: trace, timeout, compression, CORS
//! 2. body limit
//! 3. `request_id`, `request_timing`, `security_headers`
//! 4. `access_claims` (bearer token into request extensions)
//! 5. per-route guards (`require_user` / `require_staff` / `require_admin`)

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::MethodRouter,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::links::API_PREFIX,
    routes::{Guard, RouteSpec, ROUTES},
    services::AppState,
};

/// Largest accepted request body; uploads are the big ones
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// =====================================
// Router Builder
// =====================================
/// Build the application router.
///
/// ```rust,ignore
/// let state = AppState::new(Config::from_env()?);
/// let app = create_router(state);
/// axum::serve(listener, app).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    let api = ROUTES
        .iter()
        .fold(Router::new(), |api, spec| api.route(&spec.path, guarded(spec)));

    let timeout = Duration::from_secs(state.config.request_timeout_sec);

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), access_claims))
        .layer(from_fn(security_headers))
        .layer(from_fn(request_timing))
        .layer(from_fn(request_id))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Handler plus its guards. Guards run in table order, before the handler.
fn guarded(spec: &RouteSpec) -> MethodRouter<AppState> {
    spec.guards
        .iter()
        .fold(method_router(spec.method, spec.handler), |router, guard| match guard {
            Guard::Authenticated => router.route_layer(from_fn(require_user)),
            Guard::Staff => router.route_layer(from_fn(require_staff)),
            Guard::Admin => router.route_layer(from_fn(require_admin)),
        })
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
