use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::registry::LinkRegistry;

use super::handlers::{create_short_url, get_short_url_stats, health_check, AppState};

pub fn create_api_router(registry: Arc<LinkRegistry>, audit: AuditLogger) -> Router {
    let state = Arc::new(AppState { registry, audit });

    Router::new()
        .route("/health", get(health_check))
        .route("/shorturls", post(create_short_url))
        .route("/shorturls/{code}", get(get_short_url_stats))
        .with_state(state)
}
