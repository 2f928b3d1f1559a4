use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ebb_core::remote::TableError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl From<TableError> for AppError {
    fn from(error: TableError) -> Self {
        match &error {
            TableError::NotFound(_) => Self::NotFound(error.to_string()),
            TableError::BlankTitle => Self::BadRequest(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
