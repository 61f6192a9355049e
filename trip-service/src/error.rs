use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bmg_shared::store::StoreError;
use log::{error, warn};

use crate::services::ServiceError;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    pub fn bad_request(message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: String) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

// Store failures surface as client errors
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::bad_request(msg),
            ServiceError::NotFound(what) => AppError::not_found(format!("{} not found", what)),
            ServiceError::Store(e) => e.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
