//! Polymorphic interface to the external compute engine.

use arcus_core::estimate::UsageMetrics;
use arcus_core::process::ProcessGraph;
use arcus_core::types::BackendHandle;
use async_trait::async_trait;

/// Errors from a compute backend.
///
/// The lifecycle controller never lets these cross its boundary for
/// submit/refresh/cancel; they are captured onto the job record. The
/// deletion executor uses [`is_retryable`](Self::is_retryable) to decide
/// between backing off and aborting.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend rejected the submitted process graph.
    #[error("Submission rejected: {0}")]
    Submission(String),

    /// The backend does not know the given handle.
    #[error("Backend job not found")]
    NotFound,

    /// The backend refused the operation for authorization reasons.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Network-class failure: connection refused, timeout, DNS, TLS.
    #[error("Transient backend error: {0}")]
    Transient(String),

    /// The backend returned an unexpected non-2xx response.
    #[error("Backend API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl BackendError {
    /// Whether retrying the same call later can plausibly succeed.
    ///
    /// Server-side 5xx responses count as transient; rejections, missing
    /// handles, and permission failures do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Submission(_) | Self::NotFound | Self::PermissionDenied(_) => false,
        }
    }
}

/// Result of a backend-side delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backend removed the job.
    Deleted,
    /// The backend had no trace of the job (eventually-consistent stores
    /// report this after a previous, partially-applied delete). Treated
    /// as success by callers.
    AlreadyGone,
}

/// Snapshot of a job as the backend reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendPoll {
    /// Raw backend state string (e.g. `RUNNING`, `SUCCEEDED`); mapped to
    /// the lifecycle enum via [`StateMap`](crate::StateMap).
    pub state: String,
    /// Completion percentage, when the backend reports one.
    pub progress: Option<i16>,
    /// Resource usage, reported once execution ends.
    pub usage: Option<UsageMetrics>,
}

/// Handle-based contract with the external compute engine.
///
/// All calls are I/O-bound and may suspend; callers must not hold
/// registry locks across them.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Submit a process graph for execution, returning the backend handle.
    async fn submit(&self, process: &ProcessGraph) -> Result<BackendHandle, BackendError>;

    /// Poll the backend-reported state of a submitted job.
    async fn poll_status(&self, handle: &BackendHandle) -> Result<BackendPoll, BackendError>;

    /// Ask the backend to stop a queued or running job. Best-effort.
    async fn cancel(&self, handle: &BackendHandle) -> Result<(), BackendError>;

    /// Remove the job and its artifacts on the backend side.
    async fn delete(&self, handle: &BackendHandle) -> Result<DeleteOutcome, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_server_errors_are_retryable() {
        assert!(BackendError::Transient("connection refused".into()).is_retryable());
        assert!(BackendError::Api { status: 503, body: String::new() }.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!BackendError::NotFound.is_retryable());
        assert!(!BackendError::PermissionDenied("no".into()).is_retryable());
        assert!(!BackendError::Submission("bad graph".into()).is_retryable());
        assert!(!BackendError::Api { status: 400, body: String::new() }.is_retryable());
    }
}
