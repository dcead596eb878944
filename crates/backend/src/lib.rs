//! Compute-backend adapter layer.
//!
//! The lifecycle controller depends only on the [`BackendAdapter`] trait;
//! one implementation exists per supported compute backend, selected at
//! construction time. This crate ships the trait, the configurable
//! backend-state mapping table, and an HTTP reference adapter.

pub mod adapter;
pub mod http;
pub mod state_map;

pub use adapter::{BackendAdapter, BackendError, BackendPoll, DeleteOutcome};
pub use http::HttpBackend;
pub use state_map::StateMap;
