//! Exponential-backoff retry executor for deletion calls.
//!
//! Deleting a job touches two slow, failure-prone stores (the compute
//! backend and the registry). Both are eventually consistent about
//! deletes, so transient failures are expected and worth retrying with
//! increasing delays, while "already deleted" is success and permission
//! errors abort immediately.

use std::time::Duration;

use arcus_backend::BackendError;
use arcus_registry::RegistryError;
use tokio_util::sync::CancellationToken;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Total number of attempts before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

/// Classifies an operation's errors for the retry loop.
pub trait RetryClass {
    /// Whether retrying the same call later can plausibly succeed.
    fn is_retryable(&self) -> bool;
}

impl RetryClass for BackendError {
    fn is_retryable(&self) -> bool {
        BackendError::is_retryable(self)
    }
}

impl RetryClass for RegistryError {
    /// Only store-level failures are transient; everything else in the
    /// registry taxonomy signals a consistency bug.
    fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Database(_))
    }
}

/// Terminal result of a retried deletion that did not succeed.
///
/// The caller surfaces this but does not itself retry; the target record
/// stays in its pre-deletion state, so the whole operation remains safe
/// to re-issue.
#[derive(Debug, thiserror::Error)]
pub enum FinalFailure<E>
where
    E: std::fmt::Debug + std::fmt::Display,
{
    /// A non-retryable error aborted the loop on the attempt it occurred.
    #[error("Aborted by non-retryable error: {0}")]
    Aborted(E),

    /// Every attempt failed with a retryable error.
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The caller's cancellation token fired; no further attempts were
    /// made and attempts already made are not rolled back.
    #[error("Cancelled before completion")]
    Cancelled,
}

/// Run `op` until it succeeds, retrying retryable failures with
/// exponential backoff up to [`RetryPolicy::max_attempts`].
///
/// The waits are cooperative (`tokio::time::sleep`) and race against
/// `cancel`, so an aborted request stops retrying promptly. `target`
/// only labels log lines.
pub async fn delete_with_retry<T, E, F, Fut>(
    target: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, FinalFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: RetryClass + std::fmt::Debug + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(FinalFailure::Cancelled);
        }

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(delete_target = target, attempt, "Deletion succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::warn!(delete_target = target, attempt, error = %e, "Deletion aborted by non-retryable error");
                return Err(FinalFailure::Aborted(e));
            }
            Err(e) => {
                if attempt >= max_attempts {
                    tracing::warn!(delete_target = target, attempts = attempt, error = %e, "Deletion retries exhausted");
                    return Err(FinalFailure::Exhausted { attempts: attempt, last: e });
                }
                tracing::debug!(
                    delete_target = target,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Deletion attempt failed, backing off",
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FinalFailure::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = next_delay(delay, policy);
            }
        }
    }
}
