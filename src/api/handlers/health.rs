//! # Health Check Handler

use axum::Json;

use crate::models::HealthResponse;

/// `GET /api/health`
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
