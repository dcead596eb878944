//! Domain-level error taxonomy.
//!
//! Registry- and backend-specific errors live in their own crates; this
//! enum covers the errors that belong to the pure domain logic.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A cost estimate was requested before the backend reported usage
    /// metrics (typically: the job is not `finished` yet).
    #[error("Cost estimate unavailable: {0}")]
    Unavailable(String),

    /// The submission named an API version that is not in the supported
    /// catalog set.
    #[error("Unsupported API version {requested:?} (supported: {supported})")]
    UnsupportedApiVersion {
        requested: String,
        supported: String,
    },

    /// Caller-supplied input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An invariant was broken that callers cannot recover from.
    #[error("Internal error: {0}")]
    Internal(String),
}
