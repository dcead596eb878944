//! Domain types shared across the arcus workspace.
//!
//! This crate has no internal dependencies and no I/O: opaque identifier
//! newtypes, the error taxonomy, process-graph handling, and the pure
//! cost-estimation logic live here.

pub mod error;
pub mod estimate;
pub mod process;
pub mod types;
