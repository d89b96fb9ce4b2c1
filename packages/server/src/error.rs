use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_common::{RatingError, RoleTransitionError, SlugError};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNAUTHENTICATED`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Rating must be between 1 and 5, got 6")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthenticated,
    PermissionDenied(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "UNAUTHENTICATED",
                    message: "Authentication required".into(),
                },
            ),
            AppError::PermissionDenied(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<SlugError> for AppError {
    fn from(err: SlugError) -> Self {
        AppError::Validation(format!("Cannot derive a slug: {err}"))
    }
}

impl From<RoleTransitionError> for AppError {
    fn from(err: RoleTransitionError) -> Self {
        match err {
            RoleTransitionError::AlreadyInRole(_) => AppError::Conflict(err.to_string()),
            RoleTransitionError::UnknownRole(_) => AppError::Internal(err.to_string()),
        }
    }
}

/// The constraint message if `err` is a unique-constraint violation.
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}

/// Map a unique-constraint violation to `Conflict(message)`, anything else to `Internal`.
pub fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    if let Some(detail) = unique_violation(&err) {
        tracing::debug!(%detail, "Unique constraint caught on write");
        AppError::Conflict(message.to_string())
    } else {
        AppError::from(err)
    }
}
