//! Handlers for the `/jobs` resource.
//!
//! Ownership is enforced here: owned jobs are only visible to their
//! owner, unowned (anonymous) jobs to everyone. When a job carries a
//! cost estimate, it is surfaced both as a `costs` field and as the
//! experimental `OpenEO-Costs` response header.

use arcus_core::types::JobId;
use arcus_registry::models::{Job, JobListQuery, SubmitRequest};
use arcus_registry::OwnerScope;
use axum::extract::{Path, Query, State};
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Experimental response header carrying the job's cost estimate.
const COSTS_HEADER: &str = "openeo-costs";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a job by ID and verify the caller may touch it.
///
/// Returns `NotFound` if the job does not exist, `Forbidden` if it is
/// owned by somebody else. `action` is used in the error message
/// (e.g. "view", "cancel", "delete").
async fn find_and_authorize(
    state: &AppState,
    job_id: &JobId,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Job> {
    let job = state.controller.get(job_id).await?;
    if !auth.may_access(job.owner.as_ref()) {
        return Err(AppError::Forbidden(format!(
            "Cannot {action} another user's job"
        )));
    }
    Ok(job)
}

/// Build a job response, attaching the costs header when an estimate is
/// present.
fn job_response(status: StatusCode, job: Job) -> Response {
    let costs_header = job.costs.as_ref().and_then(|costs| {
        HeaderValue::from_str(&format!("{} {}", costs.amount, costs.unit)).ok()
    });

    let mut response = (status, Json(DataResponse { data: job })).into_response();
    if let Some(value) = costs_header {
        response
            .headers_mut()
            .insert(HeaderName::from_static(COSTS_HEADER), value);
    }
    response
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Submit a new batch job. Returns 201 with the job view: `queued` with
/// a backend handle on success, `error` with the captured failure when
/// the backend rejected the submission.
pub async fn submit_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitRequest>,
) -> AppResult<Response> {
    let job = state.controller.submit(input, auth.user.clone()).await?;

    tracing::info!(
        job_id = %job.id,
        status = %job.status,
        owner = auth.user.as_ref().map(|u| u.as_str()).unwrap_or("<anonymous>"),
        "Job submitted",
    );

    Ok(job_response(StatusCode::CREATED, job))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// List the caller's jobs, newest first. Anonymous callers see unowned
/// jobs. Supports optional `status`, `limit`, and `offset` query
/// parameters.
pub async fn list_jobs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let scope = match &auth.user {
        Some(user) => OwnerScope::User(user),
        None => OwnerScope::Anonymous,
    };
    let jobs = state.controller.list(scope, &params).await?;

    Ok(Json(DataResponse { data: jobs }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Response> {
    let job = find_and_authorize(&state, &JobId::from(job_id), &auth, "view").await?;
    Ok(job_response(StatusCode::OK, job))
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/refresh
///
/// Reconcile the stored status with the backend-reported one and return
/// the (possibly updated) job view. When the refresh reaches `finished`,
/// the response carries the freshly computed cost estimate.
pub async fn refresh_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Response> {
    let job_id = JobId::from(job_id);
    find_and_authorize(&state, &job_id, &auth, "refresh").await?;

    let job = state.controller.refresh(&job_id).await?;
    Ok(job_response(StatusCode::OK, job))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/cancel
///
/// Cancel a non-terminal job. Returns the canceled job view; 409 if the
/// job is already in a terminal state.
pub async fn cancel_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Response> {
    let job_id = JobId::from(job_id);
    find_and_authorize(&state, &job_id, &auth, "cancel").await?;

    let job = state.controller.cancel(&job_id).await?;
    tracing::info!(job_id = %job.id, "Job canceled via API");
    Ok(job_response(StatusCode::OK, job))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/jobs/{id}
///
/// Delete a job from the backend and the registry. Idempotent: deleting
/// an absent job returns 204 as well. 502 when deletion exhausted its
/// retries (the job is unchanged and the call may be repeated).
pub async fn delete_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<StatusCode> {
    let job_id = JobId::from(job_id);
    match find_and_authorize(&state, &job_id, &auth, "delete").await {
        Ok(_) => {}
        // Absent is fine: delete is idempotent.
        Err(AppError::Lifecycle(e)) if is_not_found(&e) => return Ok(StatusCode::NO_CONTENT),
        Err(e) => return Err(e),
    }

    // No external canceller for API-driven deletes; an aborted request
    // drops this future mid-retry, token and all.
    let cancel = CancellationToken::new();
    state.controller.delete(&job_id, &cancel).await?;

    tracing::info!(job_id = %job_id, "Job deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

fn is_not_found(err: &arcus_lifecycle::LifecycleError) -> bool {
    matches!(
        err,
        arcus_lifecycle::LifecycleError::Registry(arcus_registry::RegistryError::NotFound(_))
    )
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}/estimate
///
/// On-demand cost estimate for a job. 400 with `ESTIMATE_UNAVAILABLE`
/// until the backend has reported usage metrics.
pub async fn estimate_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job_id = JobId::from(job_id);
    find_and_authorize(&state, &job_id, &auth, "estimate").await?;

    let costs = state.controller.estimate_costs(&job_id, None).await?;
    Ok(Json(DataResponse { data: costs }))
}
