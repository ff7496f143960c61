//! # Custom Extractors
//!
//! Identity and validated input, each rejecting with an [`AppError`] so
//! every failure renders the same error body.
//!
//! - [`CurrentUser`]: claims of a guarded route, 401 when absent
//! - [`Viewer`]: optional claims, never rejects
//! - [`ValidatedJson`] / [`ValidatedPath`] / [`ValidatedQuery`]: 400 on
//!   malformed input, 422 on constraint violations

use std::convert::Infallible;

use axum::{
    async_trait,
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query,
    },
    http::{header, request::Parts, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::AppError,
    models::AccessClaims,
    services::extract_token_from_header,
};

// =====================================
// Identity
// =====================================
/// Claims attached by the `access_claims` middleware.
///
/// ```rust,ignore
/// async fn handler(CurrentUser(claims): CurrentUser) -> ... {
///     claims.user_id
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub AccessClaims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(AppError::unauthorized)
    }
}

/// Claims when the caller sent a valid token. Decides whether drafts
/// are visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer(pub Option<AccessClaims>);

impl Viewer {
    #[must_use]
    pub fn claims(&self) -> Option<&AccessClaims> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<AccessClaims>().copied()))
    }
}

/// Raw bearer token, for the OAuth token exchange where the header holds
/// an OAuth token rather than an access token
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_token_from_header)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| AppError::Unauthorized("Missing or malformed Authorization header".to_string()))
    }
}

// =====================================
// Validated input
// =====================================
/// JSON body, deserialized then validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("Invalid JSON: {}", e)))?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}

/// Path parameters, deserialized then validated
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(data): Path<T> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| AppError::BadRequest(format!("Invalid path: {}", e)))?;

        data.validate()?;

        Ok(ValidatedPath(data))
    }
}

/// Query string, deserialized then validated
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data): Query<T> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::BadRequest(format!("Invalid query: {}", e)))?;

        data.validate()?;

        Ok(ValidatedQuery(data))
    }
}
