use crate::catalog::gate::GateError;
use crate::catalog::ingest::IngestError;
use crate::storage::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every failure a bulk upload endpoint can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upload '{0}' not found")]
    UploadNotFound(String),
    #[error("job '{0}' not found")]
    JobNotFound(String),
    #[error("the file is larger than the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ingest(IngestError::UnsupportedFormat(_)) => "unsupported_format",
            ApiError::Ingest(IngestError::EmptyFile) => "empty_file",
            ApiError::Ingest(IngestError::RowLimitExceeded { .. }) => "row_limit_exceeded",
            ApiError::Ingest(_) => "unreadable_file",
            ApiError::Gate(GateError::InvalidTransition { .. }) => "invalid_transition",
            ApiError::Gate(GateError::UnknownRow(_)) => "unknown_row",
            ApiError::Store(_) => "storage_unavailable",
            ApiError::UploadNotFound(_) => "upload_not_found",
            ApiError::JobNotFound(_) => "job_not_found",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ingest(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gate(GateError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            ApiError::Gate(GateError::UnknownRow(_))
            | ApiError::UploadNotFound(_)
            | ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}
