//! # Section Handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::{
        extractors::{CurrentUser, ValidatedJson, ValidatedPath, ValidatedQuery, Viewer},
        handlers::remove_objects,
    },
    error::Result,
    models::{
        CreateSectionBody, IsPublishedBody, PaginatedResponse, PaginationQuery, SectionPathParams, SectionResponse,
        SeriesPathParams, UpdateSectionBody,
    },
    services::AppState,
};

/// `GET /api/v1/languages/:languageSlug/series/:seriesSlug/sections`
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> Result<Json<PaginatedResponse<SectionResponse>>> {
    let (count, sections) = state.catalog.list_sections(viewer.claims(), &params, &query).await?;
    let domain = state.domain();

    Ok(Json(PaginatedResponse::new(
        domain,
        &params.path().sections(),
        &query,
        count,
        sections,
        |section| SectionResponse::from_record(domain, &section),
    )))
}

/// `GET .../sections/:sectionID`, embedding the visible lessons
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
) -> Result<Json<SectionResponse>> {
    let (section, lessons) = state.catalog.get_section(viewer.claims(), &params).await?;
    Ok(Json(SectionResponse::with_lessons(state.domain(), &section, &lessons)))
}

/// `POST .../sections`
pub async fn create(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SeriesPathParams>,
    ValidatedJson(body): ValidatedJson<CreateSectionBody>,
) -> Result<(StatusCode, Json<SectionResponse>)> {
    let section = state.catalog.create_section(&params, &body).await?;
    Ok((StatusCode::CREATED, Json(SectionResponse::from_record(state.domain(), &section))))
}

/// `PUT .../sections/:sectionID`
pub async fn update(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
    ValidatedJson(body): ValidatedJson<UpdateSectionBody>,
) -> Result<Json<SectionResponse>> {
    let section = state.catalog.update_section(&params, &body).await?;
    Ok(Json(SectionResponse::from_record(state.domain(), &section)))
}

/// `PATCH .../sections/:sectionID/publish`
pub async fn publish(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
    ValidatedJson(body): ValidatedJson<IsPublishedBody>,
) -> Result<Json<SectionResponse>> {
    let section = state.catalog.publish_section(&params, body.is_published).await?;
    Ok(Json(SectionResponse::from_record(state.domain(), &section)))
}

/// `DELETE .../sections/:sectionID`
pub async fn delete(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
) -> Result<StatusCode> {
    let objects = state.catalog.delete_section(&params).await?;
    remove_objects(&state, objects).await;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST .../sections/:sectionID/progress`
pub async fn create_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
) -> Result<(StatusCode, Json<SectionResponse>)> {
    let (section, created) = state.catalog.create_section_progress(claims.user_id, &params).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(SectionResponse::from_record(state.domain(), &section))))
}

/// `DELETE .../sections/:sectionID/progress`
pub async fn delete_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<SectionPathParams>,
) -> Result<StatusCode> {
    state.catalog.delete_section_progress(claims.user_id, &params).await?;
    Ok(StatusCode::NO_CONTENT)
}
