//! The job lifecycle controller.
//!
//! Single owner of job status mutations. Backend failures during
//! submit/refresh/cancel are captured onto the job record and never
//! propagate past this boundary; registry errors (`NotFound`,
//! `InvalidTransition`, ...) do propagate, since they signal caller bugs
//! or races rather than backend weather.
//!
//! Backend calls are made without holding any registry state: each local
//! transition is a separate `update_status` call, so the registry lock is
//! only held around the local write.

use std::sync::Arc;

use arcus_backend::{BackendAdapter, BackendError, DeleteOutcome, StateMap};
use arcus_core::error::CoreError;
use arcus_core::estimate::{self, BillingRates, CostEstimate, DEFAULT_COST_UNIT};
use arcus_core::process::ProcessCatalog;
use arcus_core::types::{JobId, UserId};
use arcus_registry::models::{ErrorDetail, Job, JobListQuery, StatusUpdate, SubmitRequest};
use arcus_registry::status::JobStatus;
use arcus_registry::{JobRegistry, OwnerScope, RegistryError};
use tokio_util::sync::CancellationToken;

use crate::backoff::{delete_with_retry, FinalFailure, RetryPolicy};

/// Error codes recorded in a job's error detail.
const CODE_SUBMISSION_FAILED: &str = "SubmissionFailed";
const CODE_POLL_FAILED: &str = "PollFailed";
const CODE_CANCEL_WARNING: &str = "CancelWarning";

/// Errors surfaced by controller operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Backend-side deletion exhausted its retries or was aborted. The
    /// job record is left intact, so the caller may safely retry the
    /// whole delete.
    #[error("Backend-side deletion failed: {0}")]
    BackendDeletion(FinalFailure<BackendError>),

    /// Registry-side deletion exhausted its retries.
    #[error("Registry-side deletion failed: {0}")]
    RegistryDeletion(FinalFailure<RegistryError>),
}

/// Static configuration of the controller.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Supported-version set checked at submission.
    pub catalog: ProcessCatalog,
    /// Backend-state to lifecycle-status mapping table.
    pub state_map: StateMap,
    /// Backoff policy for the deletion executor.
    pub retry: RetryPolicy,
    /// Unit tag attached to cost estimates.
    pub cost_unit: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            catalog: ProcessCatalog::default(),
            state_map: StateMap::default(),
            retry: RetryPolicy::default(),
            cost_unit: DEFAULT_COST_UNIT.to_string(),
        }
    }
}

/// Orchestrates the job state machine across the registry and the
/// compute backend.
pub struct JobLifecycleController {
    registry: Arc<dyn JobRegistry>,
    backend: Arc<dyn BackendAdapter>,
    config: LifecycleConfig,
}

impl JobLifecycleController {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        backend: Arc<dyn BackendAdapter>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            config,
        }
    }

    /// Create a job record and submit it to the backend.
    ///
    /// On backend success the job moves to `Queued` with its handle
    /// stored; on backend failure it moves to `Error` with the failure
    /// captured. Either way a consistent job view is returned.
    pub async fn submit(
        &self,
        request: SubmitRequest,
        owner: Option<UserId>,
    ) -> Result<Job, LifecycleError> {
        self.config.catalog.check(&request.api_version)?;

        let process = request.process.clone();
        let job = Job::new(JobId::new(), owner, request);
        let id = self.registry.create(job).await?;
        tracing::info!(job_id = %id, "Job record created");

        let update = match self.backend.submit(&process).await {
            Ok(handle) => {
                tracing::info!(job_id = %id, handle = %handle, "Job submitted to backend");
                (JobStatus::Queued, StatusUpdate::default().with_handle(handle))
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Backend rejected submission");
                (
                    JobStatus::Error,
                    StatusUpdate::default()
                        .with_error(ErrorDetail::new(CODE_SUBMISSION_FAILED, e.to_string())),
                )
            }
        };
        Ok(self.registry.update_status(&id, update.0, update.1).await?)
    }

    /// Fetch a job view.
    pub async fn get(&self, id: &JobId) -> Result<Job, LifecycleError> {
        Ok(self.registry.get(id).await?)
    }

    /// List jobs in scope, newest first.
    pub async fn list(
        &self,
        scope: OwnerScope<'_>,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, LifecycleError> {
        Ok(self.registry.list(scope, query).await?)
    }

    /// Reconcile the stored status with what the backend reports.
    ///
    /// Writes to the registry only when something changed. On reaching
    /// `Finished` the cost estimate is computed from the backend's usage
    /// metrics and stored alongside. Poll failures are recorded on the
    /// job, not thrown.
    pub async fn refresh(&self, id: &JobId) -> Result<Job, LifecycleError> {
        let job = self.registry.get(id).await?;
        if job.status.is_terminal() {
            return Ok(job);
        }
        let Some(handle) = job.handle.clone() else {
            // Never reached the backend (submission failed or is in
            // flight); nothing to reconcile.
            return Ok(job);
        };

        let poll = match self.backend.poll_status(&handle).await {
            Ok(poll) => poll,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Backend poll failed; recording on job");
                let update = StatusUpdate::default()
                    .with_error(ErrorDetail::new(CODE_POLL_FAILED, e.to_string()));
                return Ok(self.registry.update_status(id, job.status, update).await?);
            }
        };

        let Some(mapped) = self.config.state_map.map(&poll.state) else {
            tracing::warn!(
                job_id = %id,
                backend_state = %poll.state,
                "Backend reported an unmapped state; keeping stored status",
            );
            return Ok(job);
        };

        if mapped == job.status {
            // Avoid redundant writes: only progress changes are worth one.
            return match poll.progress {
                Some(progress) if job.progress != Some(progress) => {
                    let update = StatusUpdate::default().with_progress(progress);
                    Ok(self.registry.update_status(id, mapped, update).await?)
                }
                _ => Ok(job),
            };
        }

        if !job.status.can_transition_to(mapped) {
            // A backend report must never move the machine backwards
            // (e.g. Running reported as QUEUED again).
            tracing::warn!(
                job_id = %id,
                from = %job.status,
                backend_state = %poll.state,
                to = %mapped,
                "Backend reported an unreachable state; keeping stored status",
            );
            return Ok(job);
        }

        let mut update = StatusUpdate::default();
        if let Some(progress) = poll.progress {
            update = update.with_progress(progress);
        }
        if let Some(usage) = poll.usage.clone() {
            update = update.with_usage(usage);
        }
        if mapped == JobStatus::Finished {
            match estimate::estimate(poll.usage.as_ref(), None, &self.config.cost_unit) {
                Ok(costs) => update = update.with_costs(costs),
                Err(e) => {
                    tracing::debug!(job_id = %id, error = %e, "No cost estimate at finish");
                }
            }
        }

        tracing::info!(job_id = %id, from = %job.status, to = %mapped, "Job status refreshed");
        Ok(self.registry.update_status(id, mapped, update).await?)
    }

    /// Cancel a non-terminal job.
    ///
    /// The backend cancel is best-effort: its failure is recorded as a
    /// warning on the job, which still transitions to `Canceled` locally.
    /// Canceling a terminal job fails with `InvalidTransition`.
    pub async fn cancel(&self, id: &JobId) -> Result<Job, LifecycleError> {
        let job = self.registry.get(id).await?;
        if job.status.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Canceled,
            }
            .into());
        }

        let mut update = StatusUpdate::default();
        if let Some(handle) = &job.handle {
            if let Err(e) = self.backend.cancel(handle).await {
                tracing::warn!(
                    job_id = %id,
                    error = %e,
                    "Backend cancel failed; job is canceled locally anyway",
                );
                update = update.with_error(ErrorDetail::new(
                    CODE_CANCEL_WARNING,
                    format!("backend cancel failed: {e}"),
                ));
            }
        }

        tracing::info!(job_id = %id, "Job canceled");
        Ok(self
            .registry
            .update_status(id, JobStatus::Canceled, update)
            .await?)
    }

    /// Delete a job from both the backend and the registry.
    ///
    /// A non-terminal job is canceled first (best-effort). Both
    /// destructive calls run through the backoff executor; `cancel_token`
    /// aborts further retries when the caller goes away. Idempotent: an
    /// absent job deletes successfully.
    pub async fn delete(
        &self,
        id: &JobId,
        cancel_token: &CancellationToken,
    ) -> Result<(), LifecycleError> {
        let job = match self.registry.get(id).await {
            Ok(job) => job,
            Err(RegistryError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if !job.status.is_terminal() {
            if let Err(e) = self.cancel(id).await {
                // Lost a race with a concurrent transition; deletion
                // proceeds regardless.
                tracing::debug!(job_id = %id, error = %e, "Pre-delete cancel skipped");
            }
        }

        if let Some(handle) = job.handle.clone() {
            let backend = Arc::clone(&self.backend);
            let outcome = delete_with_retry("backend", &self.config.retry, cancel_token, move || {
                let backend = Arc::clone(&backend);
                let handle = handle.clone();
                async move { backend.delete(&handle).await }
            })
            .await
            .map_err(LifecycleError::BackendDeletion)?;

            if outcome == DeleteOutcome::AlreadyGone {
                tracing::debug!(job_id = %id, "Backend had already dropped the job");
            }
        }

        let registry = Arc::clone(&self.registry);
        let registry_id = id.clone();
        delete_with_retry("registry", &self.config.retry, cancel_token, move || {
            let registry = Arc::clone(&registry);
            let registry_id = registry_id.clone();
            async move { registry.delete(&registry_id).await }
        })
        .await
        .map_err(LifecycleError::RegistryDeletion)?;

        tracing::info!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// Compute a cost estimate for a job on demand, optionally scoped to
    /// the caller's billing rates. Pure read: the job is not mutated.
    /// Fails with `Unavailable` until the backend has reported usage.
    pub async fn estimate_costs(
        &self,
        id: &JobId,
        rates: Option<&BillingRates>,
    ) -> Result<CostEstimate, LifecycleError> {
        let job = self.registry.get(id).await?;
        Ok(estimate::estimate(
            job.usage.as_ref(),
            rates,
            &self.config.cost_unit,
        )?)
    }
}
