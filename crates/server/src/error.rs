use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use server_storage::StorageError;

/// Every handler-visible failure, mapped to the status codes the wire contract
/// promises. `thiserror` carries the cause for logging; the HTTP representation is a
/// flat `{"error": "..."}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("metric not found")]
    NotFound,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Every rejection `axum::Json` can produce — bad syntax, a body that doesn't match the
/// target type, or a missing/wrong `Content-Type` — is a 400 under the wire contract,
/// never axum's own defaults of 422 or 415.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidSignature => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
