//! # Series Handlers
//!
//! Series carry an optional cover picture kept in file storage. The
//! catalog row only holds `(id, ext)`; every response resolves the URL.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::{
    api::{
        extractors::{CurrentUser, ValidatedJson, ValidatedPath, ValidatedQuery, Viewer},
        handlers::{read_upload, remove_objects},
    },
    error::{AppError, OptionExt, Result},
    models::{
        Author, CreateSeriesBody, IsPublishedBody, LanguagePathParams, PaginatedResponse, Picture, ResourcePath,
        Series, SeriesPathParams, SeriesPictureResponse, SeriesQuery, SeriesResponse, UpdateSeriesBody,
    },
    services::{AppState, ObjectKind},
};

async fn picture_url(state: &AppState, series: &Series) -> Option<String> {
    match &series.picture {
        Some(picture) => state.storage.url(picture.id, &picture.ext).await,
        None => None,
    }
}

async fn respond(state: &AppState, series: &Series) -> SeriesResponse {
    let url = picture_url(state, series).await;
    SeriesResponse::from_record(state.domain(), series, url.as_deref())
}

/// `GET /api/v1/languages/:languageSlug/series?search=&sortBy=&limit=&offset=`
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
    ValidatedQuery(query): ValidatedQuery<SeriesQuery>,
) -> Result<Json<PaginatedResponse<SeriesResponse>>> {
    let (count, series) = state
        .catalog
        .list_series(viewer.claims(), &params.language_slug, &query)
        .await?;

    let mut urls = Vec::with_capacity(series.len());
    for s in &series {
        urls.push(picture_url(&state, s).await);
    }

    let domain = state.domain();
    let mut urls = urls.into_iter();

    Ok(Json(PaginatedResponse::new(
        domain,
        &ResourcePath::language(&params.language_slug).series_list(),
        &query,
        count,
        series,
        |s| SeriesResponse::from_record(domain, &s, urls.next().flatten().as_deref()),
    )))
}

/// `GET /api/v1/languages/:languageSlug/series/:seriesSlug`
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<Json<SeriesResponse>> {
    let series = state.catalog.get_series(viewer.claims(), &params).await?;
    Ok(Json(respond(&state, &series).await))
}

/// `POST /api/v1/languages/:languageSlug/series`
///
/// The caller becomes the author. New series start unpublished.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
    ValidatedJson(body): ValidatedJson<CreateSeriesBody>,
) -> Result<(StatusCode, Json<SeriesResponse>)> {
    let author = Author::from(&state.accounts.get_user(claims.user_id).await?);
    let series = state
        .catalog
        .create_series(author, &params.language_slug, &body)
        .await?;

    Ok((StatusCode::CREATED, Json(respond(&state, &series).await)))
}

/// `PUT /api/v1/languages/:languageSlug/series/:seriesSlug`
pub async fn update(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
    ValidatedJson(body): ValidatedJson<UpdateSeriesBody>,
) -> Result<Json<SeriesResponse>> {
    let series = state.catalog.update_series(&params, &body).await?;
    Ok(Json(respond(&state, &series).await))
}

/// `PATCH /api/v1/languages/:languageSlug/series/:seriesSlug/publish`
pub async fn publish(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
    ValidatedJson(body): ValidatedJson<IsPublishedBody>,
) -> Result<Json<SeriesResponse>> {
    let series = state.catalog.publish_series(&params, body.is_published).await?;
    Ok(Json(respond(&state, &series).await))
}

/// `DELETE /api/v1/languages/:languageSlug/series/:seriesSlug`
pub async fn delete(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<StatusCode> {
    let objects = state.catalog.delete_series(&params).await?;
    remove_objects(&state, objects).await;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Picture
// =====================================
/// `GET /api/v1/languages/:languageSlug/series/:seriesSlug/picture`
pub async fn get_picture(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<Json<SeriesPictureResponse>> {
    let series = state.catalog.get_series(viewer.claims(), &params).await?;
    let picture = series.picture.as_ref().ok_or_not_found("Series picture not found")?;
    let url = picture_url(&state, &series)
        .await
        .ok_or_not_found("Series picture not found")?;

    Ok(Json(SeriesPictureResponse::from_record(
        state.domain(),
        &params.path(),
        picture,
        &url,
    )))
}

/// `POST /api/v1/languages/:languageSlug/series/:seriesSlug/picture`
///
/// Multipart with a `file` part (png or jpeg). Replaces any previous
/// picture.
pub async fn upload_picture(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SeriesPictureResponse>)> {
    let upload = read_upload(multipart).await?;
    let (id, ext) = state
        .storage
        .upload(ObjectKind::Image, &upload.bytes, upload.content_type.as_deref())
        .await?;
    let picture = Picture { id, ext };

    match state.catalog.set_series_picture(&params, picture.clone()).await {
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
        Json(SeriesPictureResponse::from_record(state.domain(), &params.path(), &picture, &url)),
    ))
}

/// `DELETE /api/v1/languages/:languageSlug/series/:seriesSlug/picture`
pub async fn delete_picture(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<StatusCode> {
    let picture = state.catalog.delete_series_picture(&params).await?;
    state.storage.delete(picture.id, &picture.ext).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Progress
// =====================================
/// `POST /api/v1/languages/:languageSlug/series/:seriesSlug/progress`
pub async fn create_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<(StatusCode, Json<SeriesResponse>)> {
    let (series, created) = state.catalog.create_series_progress(claims.user_id, &params).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(respond(&state, &series).await)))
}

/// `DELETE /api/v1/languages/:languageSlug/series/:seriesSlug/progress`
pub async fn delete_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
) -> Result<StatusCode> {
    state.catalog.delete_series_progress(claims.user_id, &params).await?;
    Ok(StatusCode::NO_CONTENT)
}
