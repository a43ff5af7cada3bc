use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure returned by any handler; always rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Gone(String),
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::InvalidInput(_) => ApiError::BadRequest(message),
            RegistryError::CodeConflict(_) => ApiError::Conflict(message),
            RegistryError::NotFound(_) => ApiError::NotFound(message),
            RegistryError::Expired(_) => ApiError::Gone(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(message)
            | ApiError::Conflict(message)
            | ApiError::NotFound(message)
            | ApiError::Gone(message) => message,
            ApiError::Internal => "Server error".to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_map_to_statuses() {
        let cases = [
            (RegistryError::InvalidInput("Invalid URL"), StatusCode::BAD_REQUEST),
            (RegistryError::CodeConflict("a".into()), StatusCode::CONFLICT),
            (RegistryError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (RegistryError::Expired("a".into()), StatusCode::GONE),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = ApiError::Internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
