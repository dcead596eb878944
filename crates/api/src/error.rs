use arcus_core::error::CoreError;
use arcus_lifecycle::LifecycleError;
use arcus_registry::RegistryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`LifecycleError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from the lifecycle controller.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The caller is not allowed to touch this job.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::Lifecycle(LifecycleError::Registry(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Lifecycle(lifecycle) => classify_lifecycle_error(lifecycle),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a lifecycle error onto an HTTP status, error code, and message.
///
/// - Registry lookup misses are definite absences: 404.
/// - Duplicate ids, rejected transitions, and handle rewrites are
///   conflicts: 409.
/// - Premature cost estimates and unsupported versions are the caller's
///   problem: 400.
/// - Exhausted deletions surface as 502 so the caller knows to retry.
fn classify_lifecycle_error(err: &LifecycleError) -> (StatusCode, &'static str, String) {
    match err {
        LifecycleError::Registry(registry) => match registry {
            RegistryError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "JOB_NOT_FOUND",
                format!("Job {id} not found"),
            ),
            RegistryError::DuplicateId(_) => {
                (StatusCode::CONFLICT, "DUPLICATE_ID", registry.to_string())
            }
            RegistryError::InvalidTransition { .. } => (
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                registry.to_string(),
            ),
            RegistryError::HandleAlreadySet(_) => {
                (StatusCode::CONFLICT, "CONFLICT", registry.to_string())
            }
            RegistryError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },
        LifecycleError::Core(core) => match core {
            CoreError::Unavailable(msg) => (
                StatusCode::BAD_REQUEST,
                "ESTIMATE_UNAVAILABLE",
                msg.clone(),
            ),
            CoreError::UnsupportedApiVersion { .. } => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_API_VERSION",
                core.to_string(),
            ),
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },
        LifecycleError::BackendDeletion(_) | LifecycleError::RegistryDeletion(_) => {
            tracing::error!(error = %err, "Deletion gave up");
            (
                StatusCode::BAD_GATEWAY,
                "DELETION_FAILED",
                "Deletion did not complete; the job is unchanged and the request may be retried"
                    .to_string(),
            )
        }
    }
}
