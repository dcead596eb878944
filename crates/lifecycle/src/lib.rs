//! Job lifecycle orchestration.
//!
//! [`controller::JobLifecycleController`] owns the state machine: it is
//! the only component that mutates job status, reconciling registry state
//! with what the compute backend reports. [`backoff`] provides the
//! retrying executor that makes deletion reliable against an
//! eventually-consistent backend.

pub mod backoff;
pub mod controller;

pub use backoff::{delete_with_retry, FinalFailure, RetryClass, RetryPolicy};
pub use controller::{JobLifecycleController, LifecycleConfig, LifecycleError};
