//! HTTP mapping for registry errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use rlenvs::EnvError;

/// Wrapper giving [`EnvError`] an HTTP representation: construction
/// failures are server errors with the backend message passed through
/// verbatim, everything else is a client error.
#[derive(Debug)]
pub struct ApiError(pub EnvError);

impl From<EnvError> for ApiError {
    fn from(err: EnvError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EnvError::Construction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}
