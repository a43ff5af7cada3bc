use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Redirect,
};
use std::sync::Arc;

use crate::api::handlers::referer;
use crate::api::ApiError;
use crate::registry::LinkRegistry;

pub struct RedirectState {
    pub registry: Arc<LinkRegistry>,
}

/// Redirect to the original URL, counting the visit as a click
///
/// Links expire, so the redirect is temporary rather than permanent.
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Redirect, ApiError> {
    let stats = state.registry.resolve(&code, referer(&headers))?;
    Ok(Redirect::temporary(&stats.original_url))
}
