//! API error type.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use railway_ops_server_models::ApiResponse;

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or named an unknown value.
    #[error("{0}")]
    BadRequest(String),
    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Something went wrong on our side. The detail is logged, not returned.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Builds an [`ApiError::Internal`] and logs its detail.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::error!("{detail}");
        Self::Internal(detail)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::failure(self.to_string()))
    }
}
