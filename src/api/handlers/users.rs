//! # User Handlers
//!
//! `/v1/users/me/...` acts on the caller; `/v1/users/:userID/...` is the
//! public read-only view of anyone.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::{
    api::{
        extractors::{CurrentUser, ValidatedJson, ValidatedPath},
        handlers::read_upload,
    },
    error::{AppError, OptionExt, Result},
    models::{
        DeleteUserBody, UpdateUserBody, User, UserPathParams, UserPicture, UserPictureResponse, UserProfileBody,
        UserProfileResponse, UserResponse,
    },
    services::{AppState, ObjectKind},
};

async fn user_response(state: &AppState, user: &User) -> Result<UserResponse> {
    let profile = state.accounts.find_profile(user.id).await?;
    let picture = state.accounts.find_picture(user.id).await?;

    let picture = match picture {
        Some(picture) => state
            .storage
            .url(picture.id, &picture.ext)
            .await
            .map(|url| (picture, url)),
        None => None,
    };

    Ok(UserResponse::with_embeds(
        state.domain(),
        user,
        picture.as_ref().map(|(picture, url)| (picture, url.as_str())),
        profile.as_ref(),
    ))
}

async fn picture_response(state: &AppState, user_id: i32) -> Result<UserPictureResponse> {
    let picture = state
        .accounts
        .find_picture(user_id)
        .await?
        .ok_or_not_found("Picture not found")?;
    let url = state
        .storage
        .url(picture.id, &picture.ext)
        .await
        .ok_or_not_found("Picture not found")?;

    Ok(UserPictureResponse::from_record(state.domain(), &picture, &url))
}

async fn profile_response(state: &AppState, user_id: i32) -> Result<UserProfileResponse> {
    let profile = state
        .accounts
        .find_profile(user_id)
        .await?
        .ok_or_not_found("Profile not found")?;

    Ok(UserProfileResponse::from_record(state.domain(), &profile))
}

// =====================================
// Me
// =====================================
/// `GET /api/v1/users/me`
pub async fn get_me(State(state): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<Json<UserResponse>> {
    let user = state.accounts.get_user(claims.user_id).await?;
    Ok(Json(user_response(&state, &user).await?))
}

/// `PUT /api/v1/users/me`
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdateUserBody>,
) -> Result<Json<UserResponse>> {
    let user = state.accounts.update_user(claims.user_id, &body).await?;
    Ok(Json(user_response(&state, &user).await?))
}

/// `DELETE /api/v1/users/me` with the current password in the body
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<DeleteUserBody>,
) -> Result<StatusCode> {
    if let Some(picture) = state.accounts.delete_user(claims.user_id, &body).await? {
        if let Err(e) = state.storage.delete(picture.id, &picture.ext).await {
            warn!(user_id = claims.user_id, error = %e, "Failed to remove user picture");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------
// Profile
// ----------------------------------------
pub async fn get_my_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserProfileResponse>> {
    Ok(Json(profile_response(&state, claims.user_id).await?))
}

pub async fn create_my_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<UserProfileBody>,
) -> Result<(StatusCode, Json<UserProfileResponse>)> {
    let profile = state.accounts.create_profile(claims.user_id, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserProfileResponse::from_record(state.domain(), &profile)),
    ))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<UserProfileBody>,
) -> Result<Json<UserProfileResponse>> {
    let profile = state.accounts.update_profile(claims.user_id, &body).await?;
    Ok(Json(UserProfileResponse::from_record(state.domain(), &profile)))
}

pub async fn delete_my_profile(State(state): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<StatusCode> {
    state.accounts.delete_profile(claims.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------
// Picture
// ----------------------------------------
pub async fn get_my_picture(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserPictureResponse>> {
    Ok(Json(picture_response(&state, claims.user_id).await?))
}

/// Multipart with a `file` part (png or jpeg). Replaces any previous
/// picture.
pub async fn upload_my_picture(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UserPictureResponse>)> {
    let upload = read_upload(multipart).await?;
    let (id, ext) = state
        .storage
        .upload(ObjectKind::Image, &upload.bytes, upload.content_type.as_deref())
        .await?;

    let picture = UserPicture {
        id,
        user_id: claims.user_id,
        ext,
    };

    match state.accounts.set_picture(picture.clone()).await {
        Ok(Some(previous)) => state.storage.delete(previous.id, &previous.ext).await?,
        Ok(None) => {}
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(picture.id, &picture.ext).await {
                warn!(error = %cleanup, "Failed to remove orphaned picture");
            }
            return Err(e);
        }
    }

    let url = state
        .storage
        .url(picture.id, &picture.ext)
        .await
        .ok_or_else(|| AppError::Internal("Stored picture has no URL".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(UserPictureResponse::from_record(state.domain(), &picture, &url)),
    ))
}

pub async fn delete_my_picture(State(state): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<StatusCode> {
    let picture = state.accounts.delete_picture(claims.user_id).await?;
    state.storage.delete(picture.id, &picture.ext).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Public
// =====================================
/// `GET /api/v1/users/:userID`
pub async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<UserPathParams>,
) -> Result<Json<UserResponse>> {
    let user = state.accounts.get_user(params.user_id).await?;
    Ok(Json(user_response(&state, &user).await?))
}

pub async fn get_user_profile(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<UserPathParams>,
) -> Result<Json<UserProfileResponse>> {
    Ok(Json(profile_response(&state, params.user_id).await?))
}

pub async fn get_user_picture(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<UserPathParams>,
) -> Result<Json<UserPictureResponse>> {
    Ok(Json(picture_response(&state, params.user_id).await?))
}
