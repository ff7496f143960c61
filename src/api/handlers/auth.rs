//! # Auth Handlers
//!
//! Email and password accounts. Sign-in is two steps: the password
//! check sends a one-time code, and the code is exchanged for tokens.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::extractors::{CurrentUser, ValidatedJson},
    error::Result,
    models::{
        AuthResponse, ConfirmBody, ConfirmSignInBody, ForgotPasswordBody, MessageResponse, RefreshBody,
        ResetPasswordBody, SignInBody, SignOutBody, SignUpBody, UpdateEmailBody, UpdatePasswordBody,
    },
    services::AppState,
};

/// `POST /api/auth/register`
///
/// ```json
/// {
///   "email": "ada@example.com",
///   "firstName": "Ada",
///   "lastName": "Lovelace",
///   "location": "GBR",
///   "password": "Sup3rSecret!",
///   "password2": "Sup3rSecret!"
/// }
/// ```
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignUpBody>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(state.accounts.sign_up(&body).await?))
}

/// `POST /api/auth/confirm-email`
pub async fn confirm_email(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ConfirmBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.confirm_email(&body).await?))
}

/// `POST /api/auth/login`
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignInBody>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(state.accounts.sign_in(&body).await?))
}

/// `POST /api/auth/login/confirm`
pub async fn confirm_sign_in(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ConfirmSignInBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.confirm_sign_in(&body).await?))
}

/// `POST /api/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.refresh(&body).await?))
}

/// `POST /api/auth/forgot-password`
///
/// Answers the same way whether or not the email is known.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordBody>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(state.accounts.forgot_password(&body).await?))
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetPasswordBody>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(state.accounts.reset_password(&body).await?))
}

/// `POST /api/auth/logout`
pub async fn sign_out(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<SignOutBody>,
) -> Result<StatusCode> {
    state.accounts.sign_out(claims, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/update-password`
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdatePasswordBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.update_password(claims.user_id, &body).await?))
}

/// `POST /api/auth/update-email`
pub async fn update_email(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdateEmailBody>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.update_email(claims.user_id, &body).await?))
}
