//! Two-layer error taxonomy: services speak [`ServiceError`], the HTTP layer
//! converts into [`AppError`] and renders a JSON body with a stable code.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Failure modes of the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The installed storage backend returned an error.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No storage backend is installed; the engine runs degraded.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The caller lacks the authority for this action (host-only, or
    /// someone else's player record).
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// A request value failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The lobby or session is in a phase that does not admit the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The referenced lobby, session, player, or entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation collides with existing state, such as a full roster or
    /// a duplicate submission.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An answer arrived after its question window closed.
    #[error("too late: {0}")]
    TooLate(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

/// HTTP-facing errors; each variant maps to one status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 401, raised by the identity extractor.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),
    /// 409.
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503, degraded mode or a failing backend.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::TooLate(message) => AppError::Conflict(message),
        }
    }
}

impl AppError {
    /// Machine-stable error code carried alongside the human-readable message.
    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "invalid_argument",
            AppError::Unauthorized(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ServiceUnavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}
