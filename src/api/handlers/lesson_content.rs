//! # Lesson Content Handlers
//!
//! Article, video and downloadable files under
//! `.../lessons/:lessonID/{article,video,files}`. Article and video are
//! singletons: creating a second one is a conflict.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::warn;
use validator::Validate;

use crate::{
    api::{
        extractors::{ValidatedJson, ValidatedPath, Viewer},
        handlers::read_upload,
    },
    error::{AppError, OptionExt, Result},
    models::{
        LessonArticleBody, LessonArticleResponse, LessonFileBody, LessonFilePathParams, LessonFileResponse,
        LessonPathParams, LessonVideoBody, LessonVideoResponse,
    },
    services::{AppState, ObjectKind},
};

// =====================================
// Article
// =====================================
pub async fn get_article(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<Json<LessonArticleResponse>> {
    let location = params.location();
    let article = state.catalog.get_article(viewer.claims(), &location).await?;
    Ok(Json(LessonArticleResponse::from_record(state.domain(), &location, &article)))
}

pub async fn create_article(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<LessonArticleBody>,
) -> Result<(StatusCode, Json<LessonArticleResponse>)> {
    let location = params.location();
    let article = state.catalog.create_article(&location, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(LessonArticleResponse::from_record(state.domain(), &location, &article)),
    ))
}

pub async fn update_article(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<LessonArticleBody>,
) -> Result<Json<LessonArticleResponse>> {
    let location = params.location();
    let article = state.catalog.update_article(&location, &body).await?;
    Ok(Json(LessonArticleResponse::from_record(state.domain(), &location, &article)))
}

pub async fn delete_article(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<StatusCode> {
    state.catalog.delete_article(&params.location()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Video
// =====================================
pub async fn get_video(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<Json<LessonVideoResponse>> {
    let location = params.location();
    let video = state.catalog.get_video(viewer.claims(), &location).await?;
    Ok(Json(LessonVideoResponse::from_record(state.domain(), &location, &video)))
}

pub async fn create_video(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<LessonVideoBody>,
) -> Result<(StatusCode, Json<LessonVideoResponse>)> {
    let location = params.location();
    let video = state.catalog.create_video(&location, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(LessonVideoResponse::from_record(state.domain(), &location, &video)),
    ))
}

pub async fn update_video(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<LessonVideoBody>,
) -> Result<Json<LessonVideoResponse>> {
    let location = params.location();
    let video = state.catalog.update_video(&location, &body).await?;
    Ok(Json(LessonVideoResponse::from_record(state.domain(), &location, &video)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<StatusCode> {
    state.catalog.delete_video(&params.location()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Files
// =====================================
/// `GET .../files`: a plain array sorted by name. Files whose object is
/// missing from storage are skipped.
pub async fn list_files(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<Json<Vec<LessonFileResponse>>> {
    let location = params.location();
    let files = state.catalog.list_files(viewer.claims(), &location).await?;

    let mut responses = Vec::with_capacity(files.len());
    for file in &files {
        match state.storage.url(file.id, &file.ext).await {
            Some(url) => responses.push(LessonFileResponse::from_record(state.domain(), &location, file, &url)),
            None => warn!(file_id = %file.id, "Could not find URL for lesson file"),
        }
    }

    Ok(Json(responses))
}

pub async fn get_file(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LessonFilePathParams>,
) -> Result<Json<LessonFileResponse>> {
    let location = params.location();
    let file = state.catalog.get_file(viewer.claims(), &location, params.file_id).await?;
    let url = state
        .storage
        .url(file.id, &file.ext)
        .await
        .ok_or_not_found("Lesson file not found")?;

    Ok(Json(LessonFileResponse::from_record(state.domain(), &location, &file, &url)))
}

/// `POST .../files`: multipart with a `file` part (pdf, doc, docx, odt
/// or zip) and a `name` text part.
pub async fn upload_file(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<LessonFileResponse>)> {
    let location = params.location();
    let upload = read_upload(multipart).await?;

    let body = LessonFileBody {
        name: upload
            .name
            .ok_or_else(|| AppError::BadRequest("Missing name part".to_string()))?,
    };
    body.validate()?;

    let (id, ext) = state
        .storage
        .upload(ObjectKind::Document, &upload.bytes, upload.content_type.as_deref())
        .await?;

    let file = match state.catalog.create_file(&location, id, &body.name, &ext).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(id, &ext).await {
                warn!(error = %cleanup, "Failed to remove orphaned lesson file");
            }
            return Err(e);
        }
    };

    let url = state
        .storage
        .url(file.id, &file.ext)
        .await
        .ok_or_else(|| AppError::Internal("Stored file has no URL".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(LessonFileResponse::from_record(state.domain(), &location, &file, &url)),
    ))
}

/// Renames a file; the stored object is untouched
pub async fn update_file(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonFilePathParams>,
    ValidatedJson(body): ValidatedJson<LessonFileBody>,
) -> Result<Json<LessonFileResponse>> {
    let location = params.location();
    let file = state.catalog.update_file(&location, params.file_id, &body).await?;
    let url = state
        .storage
        .url(file.id, &file.ext)
        .await
        .ok_or_not_found("Lesson file not found")?;

    Ok(Json(LessonFileResponse::from_record(state.domain(), &location, &file, &url)))
}

pub async fn delete_file(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonFilePathParams>,
) -> Result<StatusCode> {
    let file = state.catalog.delete_file(&params.location(), params.file_id).await?;
    state.storage.delete(file.id, &file.ext).await?;
    Ok(StatusCode::NO_CONTENT)
}
