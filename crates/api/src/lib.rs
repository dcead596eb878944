//! HTTP surface of the batch-job lifecycle layer.
//!
//! Thin axum plumbing over [`arcus_lifecycle::JobLifecycleController`]:
//! request parsing, opaque-user extraction, error-to-status mapping, and
//! the costs response header. Everything stateful lives below this crate.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
