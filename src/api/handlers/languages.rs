//! # Language Handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::{
        extractors::{CurrentUser, ValidatedJson, ValidatedPath, ValidatedQuery, Viewer},
        handlers::remove_objects,
    },
    error::Result,
    models::{LanguageBody, LanguagePathParams, LanguageResponse, LanguagesQuery, PaginatedResponse, ResourcePath},
    services::AppState,
};

/// `GET /api/v1/languages?search=&limit=&offset=`
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedQuery(query): ValidatedQuery<LanguagesQuery>,
) -> Result<Json<PaginatedResponse<LanguageResponse>>> {
    let (count, languages) = state.catalog.list_languages(viewer.claims(), &query).await?;
    let domain = state.domain();

    Ok(Json(PaginatedResponse::new(
        domain,
        &ResourcePath::languages(),
        &query,
        count,
        languages,
        |language| LanguageResponse::from_record(domain, &language),
    )))
}

/// `GET /api/v1/languages/:languageSlug`
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
) -> Result<Json<LanguageResponse>> {
    let language = state.catalog.get_language(viewer.claims(), &params.language_slug).await?;
    Ok(Json(LanguageResponse::from_record(state.domain(), &language)))
}

/// `POST /api/v1/languages`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(body): ValidatedJson<LanguageBody>,
) -> Result<(StatusCode, Json<LanguageResponse>)> {
    let language = state.catalog.create_language(claims.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(LanguageResponse::from_record(state.domain(), &language))))
}

/// `PUT /api/v1/languages/:languageSlug`
pub async fn update(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
    ValidatedJson(body): ValidatedJson<LanguageBody>,
) -> Result<Json<LanguageResponse>> {
    let language = state.catalog.update_language(&params.language_slug, &body).await?;
    Ok(Json(LanguageResponse::from_record(state.domain(), &language)))
}

/// `DELETE /api/v1/languages/:languageSlug`
pub async fn delete(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
) -> Result<StatusCode> {
    let objects = state.catalog.delete_language(&params.language_slug).await?;
    remove_objects(&state, objects).await;
    Ok(StatusCode::NO_CONTENT)
}

// =====================================
// Progress
// =====================================
/// `GET /api/v1/languages/:languageSlug/progress`
pub async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
) -> Result<Json<LanguageResponse>> {
    let language = state
        .catalog
        .get_language_progress(claims.user_id, &params.language_slug)
        .await?;
    Ok(Json(LanguageResponse::from_record(state.domain(), &language)))
}

/// `POST /api/v1/languages/:languageSlug/progress`
///
/// 201 the first time, 200 when the user already follows the language.
pub async fn create_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
) -> Result<(StatusCode, Json<LanguageResponse>)> {
    let (language, created) = state
        .catalog
        .create_language_progress(claims.user_id, &params.language_slug)
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(LanguageResponse::from_record(state.domain(), &language))))
}

/// `DELETE /api/v1/languages/:languageSlug/progress`
pub async fn delete_progress(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedPath(params): ValidatedPath<LanguagePathParams>,
) -> Result<StatusCode> {
    state
        .catalog
        .delete_language_progress(claims.user_id, &params.language_slug)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
