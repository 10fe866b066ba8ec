use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::storage::StorageError;

use super::response::ErrorResponse;

/// Error returned by admin handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ErrorResponse) -> Self {
        ApiError { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, ErrorResponse::not_found(err.to_string()))
            }
            StorageError::DuplicateRoute(_) => {
                ApiError::new(StatusCode::CONFLICT, ErrorResponse::conflict(err.to_string()))
            }
            StorageError::UnknownRoute(_) | StorageError::Validation(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::bad_request(err.to_string()),
            ),
            StorageError::Database(_) => {
                error!(error = %err, "Storage failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error("Storage failure"),
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request(rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
