//! # Middleware
//!
//! `from_fn` middleware wrapped around the router:
//!
//! - [`access_claims`] parses the bearer token once per request
//! - [`require_user`], [`require_staff`] and [`require_admin`] are the
//!   route guards
//! - [`request_id`], [`request_timing`] and [`security_headers`] are
//!   applied to every response

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::AccessClaims,
    services::{extract_token_from_header, AppState},
};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =====================================
// Identity
// =====================================
/// Attach [`AccessClaims`] when the request carries a valid access token.
///
/// An invalid or expired token is treated like no token; guarded routes
/// then answer 401 through the guards below.
pub async fn access_claims(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token_from_header)
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.accounts.verify_access_token(&token).await {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(e) => debug!(error = %e, "Ignoring bearer token"),
        }
    }

    next.run(request).await
}

fn claims(request: &Request<Body>) -> Result<AccessClaims, AppError> {
    request
        .extensions()
        .get::<AccessClaims>()
        .copied()
        .ok_or_else(AppError::unauthorized)
}

/// Any signed-in user
pub async fn require_user(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    claims(&request)?;
    Ok(next.run(request).await)
}

/// Staff or admin
pub async fn require_staff(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    if !claims(&request)?.can_edit_catalog() {
        return Err(AppError::forbidden());
    }
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    if !claims(&request)?.is_admin {
        return Err(AppError::forbidden());
    }
    Ok(next.run(request).await)
}

// =====================================
// Request ID
// =====================================
/// Reuse the caller's `X-Request-Id` or generate one, and echo it back.
pub async fn request_id(mut request: Request<Body>, next: Next) -> impl IntoResponse {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_else(|| nanoid::nanoid!(12));

    let value = HeaderValue::from_str(&id).ok();
    if let Some(value) = value.clone() {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let mut response = next.run(request).await;

    if let Some(value) = value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

// =====================================
// Request Timing
// =====================================
pub async fn request_timing(request: Request<Body>, next: Next) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    let duration = start.elapsed();

    if response.status().is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// =====================================
// Security Headers
// =====================================
pub async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));

    response
}
