//! # OAuth Handlers
//!
//! The browser is sent to the provider, comes back to our callback, and
//! is forwarded to the web client with a one-time code and a short-lived
//! OAuth token. The client then trades both at `POST /auth/ext/token`.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use url::Url;

use crate::{
    api::extractors::{BearerToken, ValidatedJson, ValidatedQuery},
    error::{AppError, Result, ResultExt},
    models::{AuthResponse, OAuthCallbackQuery, OAuthProvider, OAuthTokenBody},
    services::AppState,
};

/// 302 to `location`
fn found(location: &str) -> Result<Response> {
    let location = HeaderValue::from_str(location)
        .map_app_err(|e| AppError::Internal(format!("Invalid redirect location: {}", e)))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

async fn sign_in(state: &AppState, provider: OAuthProvider) -> Result<Response> {
    let url = state.accounts.authorization_url(provider).await?;
    found(&url)
}

async fn callback(state: &AppState, provider: OAuthProvider, query: &OAuthCallbackQuery) -> Result<Response> {
    let redirect = state.accounts.oauth_callback(provider, query).await?;
    let expires_in = redirect.expires_in.to_string();

    let url = Url::parse_with_params(
        &state.config.frontend_callback_url(),
        &[
            ("code", redirect.code.as_str()),
            ("accessToken", redirect.access_token.as_str()),
            ("tokenType", "Bearer"),
            ("expiresIn", expires_in.as_str()),
        ],
    )?;

    info!(provider = provider.as_str(), "OAuth callback forwarded to client");
    found(url.as_str())
}

/// `GET /api/auth/ext/github`
pub async fn github_sign_in(State(state): State<AppState>) -> Result<Response> {
    sign_in(&state, OAuthProvider::GitHub).await
}

/// `GET /api/auth/ext/github/callback?code=...&state=...`
pub async fn github_callback(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<OAuthCallbackQuery>,
) -> Result<Response> {
    callback(&state, OAuthProvider::GitHub, &query).await
}

/// `GET /api/auth/ext/google`
pub async fn google_sign_in(State(state): State<AppState>) -> Result<Response> {
    sign_in(&state, OAuthProvider::Google).await
}

/// `GET /api/auth/ext/google/callback?code=...&state=...`
pub async fn google_callback(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<OAuthCallbackQuery>,
) -> Result<Response> {
    callback(&state, OAuthProvider::Google, &query).await
}

/// `POST /api/auth/ext/token` with `Authorization: Bearer <oauth token>`
pub async fn token(
    State(state): State<AppState>,
    BearerToken(bearer): BearerToken,
    ValidatedJson(body): ValidatedJson<OAuthTokenBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.oauth_token(&bearer, &body).await?))
}
