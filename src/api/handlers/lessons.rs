//! # Lesson Handlers
//!
//! A lesson's detail view embeds its article, video and files. Completing
//! the last lesson of a series embeds the certificate it issued.

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::{
        extractors::{CurrentUser, ValidatedJson, ValidatedPath, ValidatedQuery, Viewer},
        handlers::remove_objects,
    },
    error::Result,
    models::{
        CreateLessonBody, IsPublishedBody, LessonPathParams, LessonResponse, PaginatedResponse, PaginationQuery,
        SectionPathParams, UpdateLessonBody,
    },
    services::AppState,
};

/// `GET .../sections/:sectionID/lessons`
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> Result<Json<PaginatedResponse<LessonResponse>>> {
    let (count, lessons) = state.catalog.list_lessons(viewer.claims(), &params, &query).await?;
    let domain = state.domain();

    Ok(Json(PaginatedResponse::new(
        domain,
        &params.path().lessons(),
        &query,
        count,
        lessons,
        |lesson| LessonResponse::from_record(domain, &lesson),
    )))
}

/// `GET .../lessons/:lessonID`
///
/// Files whose object can't be resolved are left out of the embed.
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<Json<LessonResponse>> {
    let detail = state.catalog.get_lesson(viewer.claims(), &params.location()).await?;

    let mut file_urls = HashMap::with_capacity(detail.files.len());
    for file in &detail.files {
        if let Some(url) = state.storage.url(file.id, &file.ext).await {
            file_urls.insert(file.id, url);
        }
    }

    Ok(Json(LessonResponse::with_embeds(state.domain(), &detail, &file_urls)))
}

/// `POST .../lessons`
pub async fn create(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
    ValidatedJson(body): ValidatedJson<CreateLessonBody>,
) -> Result<(StatusCode, Json<LessonResponse>)> {
    let lesson = state.catalog.create_lesson(&params, &body).await?;
    Ok((StatusCode::CREATED, Json(LessonResponse::from_record(state.domain(), &lesson))))
}

/// `PUT .../lessons/:lessonID`
pub async fn update(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<UpdateLessonBody>,
) -> Result<Json<LessonResponse>> {
    let lesson = state.catalog.update_lesson(&params.location(), &body).await?;
    Ok(Json(LessonResponse::from_record(state.domain(), &lesson)))
}

/// `PATCH .../lessons/:lessonID/publish`
pub async fn publish(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
    ValidatedJson(body): ValidatedJson<IsPublishedBody>,
) -> Result<Json<LessonResponse>> {
    let lesson = state
        .catalog
        .publish_lesson(&params.location(), body.is_published)
        .await?;
    Ok(Json(LessonResponse::from_record(state.domain(), &lesson)))
}

/// `DELETE .../lessons/:lessonID`, removing its stored files too
pub async fn delete(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<StatusCode> {
    let objects = state.catalog.delete_lesson(&params.location()).await?;
    remove_objects(&state, objects).await;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Progress
// =====================================
/// `POST .../lessons/:lessonID/progress`
pub async fn create_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<(StatusCode, Json<LessonResponse>)> {
    let (lesson, created) = state
        .catalog
        .create_lesson_progress(claims.user_id, &params.location())
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(LessonResponse::from_record(state.domain(), &lesson))))
}

/// `PATCH .../lessons/:lessonID/progress/complete`
pub async fn complete(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<Json<LessonResponse>> {
    let learner = state.accounts.get_user(claims.user_id).await?;
    let (lesson, certificate) = state.catalog.complete_lesson(&learner, &params.location()).await?;

    Ok(Json(LessonResponse::with_certificate(
        state.domain(),
        &lesson,
        certificate.as_ref(),
    )))
}

/// `DELETE .../lessons/:lessonID/progress`
pub async fn delete_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LessonPathParams>,
) -> Result<StatusCode> {
    state
        .catalog
        .delete_lesson_progress(claims.user_id, &params.location())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
