//! Job record model and the DTOs that mutate it.

use arcus_core::estimate::{CostEstimate, UsageMetrics};
use arcus_core::process::{ApiVersion, ProcessGraph};
use arcus_core::types::{BackendHandle, JobId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::status::JobStatus;
use crate::RegistryError;

/// Structured error captured on a job when a backend call fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code (e.g. `SubmissionFailed`).
    pub code: String,
    /// Human-readable message, safe to surface to the job owner.
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One submitted processing request and its tracked lifecycle state.
///
/// Mutated only through [`JobRegistry::update_status`](crate::JobRegistry);
/// the identifier is immutable and the backend handle is write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Owning user; `None` for anonymous submissions.
    pub owner: Option<UserId>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Opaque process graph, forwarded to the backend untouched.
    pub process: ProcessGraph,
    pub api_version: ApiVersion,
    pub status: JobStatus,
    /// Backend-assigned identifier, set once on successful submission.
    pub handle: Option<BackendHandle>,
    /// Completion percentage while running, when the backend reports one.
    pub progress: Option<i16>,
    /// Backend-reported resource usage, available once finished.
    pub usage: Option<UsageMetrics>,
    /// Cost estimate, computed when the job reaches `finished`.
    pub costs: Option<CostEstimate>,
    /// Last captured backend error or cancellation warning.
    pub error: Option<ErrorDetail>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub started: Option<Timestamp>,
    pub finished: Option<Timestamp>,
}

impl Job {
    /// Build a fresh record in `Created` status.
    pub fn new(id: JobId, owner: Option<UserId>, request: SubmitRequest) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            owner,
            title: request.title,
            description: request.description,
            process: request.process,
            api_version: request.api_version,
            status: JobStatus::Created,
            handle: None,
            progress: None,
            usage: None,
            costs: None,
            error: None,
            created: now,
            updated: now,
            started: None,
            finished: None,
        }
    }

    /// Apply a status transition plus extra fields in one step.
    ///
    /// Reflexive updates (`new_status` equal to the current status) skip
    /// the transition check while the job is non-terminal; they are used
    /// to annotate a job with progress or a captured poll error without
    /// moving the state machine. Terminal records are immutable, so even
    /// a reflexive update is rejected there. Every call bumps `updated`;
    /// entering `Running` stamps `started`, entering a terminal state
    /// stamps `finished`.
    pub fn apply(
        &mut self,
        new_status: JobStatus,
        update: StatusUpdate,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let reflexive_ok = new_status == self.status && !self.status.is_terminal();
        if !reflexive_ok && !self.status.can_transition_to(new_status) {
            return Err(RegistryError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: new_status,
            });
        }

        if let Some(handle) = update.handle {
            if self.handle.is_some() {
                return Err(RegistryError::HandleAlreadySet(self.id.clone()));
            }
            self.handle = Some(handle);
        }

        if new_status == JobStatus::Running && self.started.is_none() {
            self.started = Some(now);
        }
        if new_status.is_terminal() && self.finished.is_none() {
            self.finished = Some(now);
        }

        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(usage) = update.usage {
            self.usage = Some(usage);
        }
        if let Some(costs) = update.costs {
            self.costs = Some(costs);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }

        self.status = new_status;
        self.updated = now;
        Ok(())
    }
}

/// DTO for submitting a new job.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub process: ProcessGraph,
    pub api_version: ApiVersion,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Extra fields applied atomically with a status transition.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub handle: Option<BackendHandle>,
    pub progress: Option<i16>,
    pub usage: Option<UsageMetrics>,
    pub costs: Option<CostEstimate>,
    pub error: Option<ErrorDetail>,
}

impl StatusUpdate {
    pub fn with_handle(mut self, handle: BackendHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_progress(mut self, progress: i16) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_costs(mut self, costs: CostEstimate) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = Some(error);
        self
    }
}

/// Query parameters for job listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by lifecycle status.
    pub status: Option<JobStatus>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Default page size for job listing.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

impl JobListQuery {
    /// Effective page size after defaulting and capping.
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Effective offset after defaulting.
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
