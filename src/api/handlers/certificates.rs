//! # Certificate Handlers

use axum::{extract::State, Json};

use crate::{
    api::extractors::{CurrentUser, ValidatedPath, ValidatedQuery},
    error::Result,
    models::{CertificatePathParams, CertificateResponse, PaginatedResponse, PaginationQuery, ResourcePath},
    services::AppState,
};

/// `GET /api/v1/certificates/:certificateID`, public so certificates can
/// be shared
pub async fn get(
    State(state): State<AppState>,
    ValidatedPath(params): ValidatedPath<CertificatePathParams>,
) -> Result<Json<CertificateResponse>> {
    let certificate = state.catalog.get_certificate(params.certificate_id).await?;
    Ok(Json(CertificateResponse::from_record(state.domain(), &certificate)))
}

/// `GET /api/v1/users/me/certificates`
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> Result<Json<PaginatedResponse<CertificateResponse>>> {
    let (count, certificates) = state.catalog.list_certificates(claims.user_id, &query).await?;
    let domain = state.domain();

    Ok(Json(PaginatedResponse::new(
        domain,
        &ResourcePath::me().user_certificates(),
        &query,
        count,
        certificates,
        |certificate| CertificateResponse::from_record(domain, &certificate),
    )))
}
