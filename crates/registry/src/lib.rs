//! Durable store of job records.
//!
//! The registry is the source of truth for job existence. It exposes CRUD
//! plus guarded status transitions behind the [`JobRegistry`] trait, with
//! two implementations: [`memory::InMemoryRegistry`] for tests and small
//! deployments, and [`postgres::PgJobRegistry`] backed by sqlx/Postgres.
//!
//! The registry never talks to the compute backend; cascading backend
//! cleanup on deletion is the lifecycle controller's job.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod status;

use arcus_core::types::{JobId, UserId};
use async_trait::async_trait;

use crate::models::{Job, JobListQuery, StatusUpdate};
use crate::status::JobStatus;

/// Errors raised by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Lookup miss: the job does not exist (or was already deleted).
    #[error("Job {0} not found")]
    NotFound(JobId),

    /// `create` was called with an identifier that is already present.
    #[error("Job {0} already exists")]
    DuplicateId(JobId),

    /// The requested status change is not reachable from the current
    /// status per the state machine. Signals a controller bug or a race
    /// the caller failed to prevent.
    #[error("Invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// The backend handle is write-once and was already set.
    #[error("Backend handle already set for job {0}")]
    HandleAlreadySet(JobId),

    /// Underlying store failure (Postgres implementation only).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Owner filter for job listings.
///
/// Listing applies this filter before pagination, so `limit`/`offset`
/// always page over the visible set.
#[derive(Debug, Clone, Copy)]
pub enum OwnerScope<'a> {
    /// Every job regardless of owner (operator view).
    Any,
    /// Only jobs with no owner.
    Anonymous,
    /// Only jobs owned by the given user.
    User(&'a UserId),
}

impl OwnerScope<'_> {
    /// Whether a job with the given owner falls inside this scope.
    pub fn matches(&self, owner: Option<&UserId>) -> bool {
        match self {
            OwnerScope::Any => true,
            OwnerScope::Anonymous => owner.is_none(),
            OwnerScope::User(user) => owner == Some(user),
        }
    }
}

/// Contract of the durable job store.
///
/// Concurrent `update_status` calls for the same identifier serialize
/// inside each implementation, so no update is lost and the transition
/// check always sees the latest status.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Insert a new record. Fails with [`RegistryError::DuplicateId`] if
    /// the identifier is already present.
    async fn create(&self, job: Job) -> Result<JobId, RegistryError>;

    /// Fetch a job by id. Fails with [`RegistryError::NotFound`] if absent.
    async fn get(&self, id: &JobId) -> Result<Job, RegistryError>;

    /// List jobs in scope, ordered by creation time descending.
    ///
    /// An unknown user yields an empty page, not an error. The page is
    /// restartable via [`JobListQuery::offset`].
    async fn list(
        &self,
        scope: OwnerScope<'_>,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, RegistryError>;

    /// Atomically apply a status transition plus any extra fields, bumping
    /// the `updated` timestamp. Fails with [`RegistryError::NotFound`] if
    /// absent, [`RegistryError::InvalidTransition`] if the state machine
    /// rejects the change. Returns the updated record.
    async fn update_status(
        &self,
        id: &JobId,
        new_status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Job, RegistryError>;

    /// Remove a record. Idempotent: deleting an absent job is a no-op
    /// success. Does not cascade to the compute backend.
    async fn delete(&self, id: &JobId) -> Result<(), RegistryError>;
}
