use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::audit::{AuditLevel, AuditLogger};
use crate::models::{CreateUrlRequest, CreateUrlResponse, LinkStats};
use crate::registry::LinkRegistry;

pub struct AppState {
    pub registry: Arc<LinkRegistry>,
    pub audit: AuditLogger,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Referring origin of the request, if the client sent one
pub(crate) fn referer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
}

/// Create a new short URL
pub async fn create_short_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected create request body");
        state
            .audit
            .log(AuditLevel::Error, "handler", "Invalid request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let url = payload.url.as_ref().and_then(serde_json::Value::as_str);
    let created = state
        .registry
        .create(url, payload.validity, payload.shortcode.as_deref())?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Record a click and return the link's stats
pub async fn get_short_url_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<LinkStats>, ApiError> {
    let stats = state.registry.resolve(&code, referer(&headers))?;
    Ok(Json(stats))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
