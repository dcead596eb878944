use std::sync::Arc;

use arcus_lifecycle::JobLifecycleController;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable (everything is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle controller, sole owner of job status mutations.
    pub controller: Arc<JobLifecycleController>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
