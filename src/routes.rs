//! Top-level router combining the API and redirect routes.
//!
//! - `GET  /health`            - health check
//! - `POST /shorturls`         - create a short link
//! - `GET  /shorturls/{code}`  - record a click and return link stats
//! - `GET  /{code}`            - record a click and redirect
//!
//! A panicking handler is answered with `500 {"error":"Server error"}` and a
//! `fatal` audit event; the server keeps running.

use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, ApiError};
use crate::audit::{AuditLevel, AuditLogger};
use crate::redirect;
use crate::registry::LinkRegistry;

pub fn app_router(registry: Arc<LinkRegistry>, audit: AuditLogger) -> Router {
    let panic_audit = audit.clone();

    Router::new()
        .merge(api::create_api_router(Arc::clone(&registry), audit))
        .merge(redirect::create_redirect_router(registry))
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| handle_panic(&panic_audit, panic),
        ))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(audit: &AuditLogger, panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };

    tracing::error!(panic = %detail, "request handler panicked");
    audit.log(AuditLevel::Fatal, "controller", detail);

    ApiError::Internal.into_response()
}
