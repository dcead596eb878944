//! Backend-state to lifecycle-status mapping.
//!
//! Different compute backends name their execution states differently,
//! and several expose intermediate states ("starting", "canceling") the
//! lifecycle enum collapses. The mapping is a configurable table rather
//! than a hard-coded match so each adapter can ship its own.

use std::collections::HashMap;

use arcus_registry::status::JobStatus;

/// Table mapping raw backend state strings to [`JobStatus`].
///
/// Lookups are case-insensitive on the backend side (keys are stored
/// uppercased). Unknown states map to `None`; callers keep the stored
/// status and log the surprise instead of guessing.
#[derive(Debug, Clone)]
pub struct StateMap {
    map: HashMap<String, JobStatus>,
}

impl StateMap {
    /// Empty table; add entries with [`with`](Self::with).
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Add or override one mapping.
    pub fn with(mut self, backend_state: &str, status: JobStatus) -> Self {
        self.map.insert(backend_state.to_uppercase(), status);
        self
    }

    /// Resolve a raw backend state string.
    pub fn map(&self, backend_state: &str) -> Option<JobStatus> {
        self.map.get(&backend_state.to_uppercase()).copied()
    }
}

impl Default for StateMap {
    /// Mapping for backends using the common batch vocabulary.
    ///
    /// Intermediate states collapse into the nearest lifecycle status:
    /// `STARTING` is still queued from the caller's point of view, and a
    /// `CANCELING` job is still running until the backend confirms.
    fn default() -> Self {
        Self::empty()
            .with("QUEUED", JobStatus::Queued)
            .with("STARTING", JobStatus::Queued)
            .with("RUNNING", JobStatus::Running)
            .with("CANCELING", JobStatus::Running)
            .with("SUCCEEDED", JobStatus::Finished)
            .with("FAILED", JobStatus::Error)
            .with("CANCELED", JobStatus::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_covers_the_batch_vocabulary() {
        let map = StateMap::default();
        assert_eq!(map.map("QUEUED"), Some(JobStatus::Queued));
        assert_eq!(map.map("RUNNING"), Some(JobStatus::Running));
        assert_eq!(map.map("SUCCEEDED"), Some(JobStatus::Finished));
        assert_eq!(map.map("FAILED"), Some(JobStatus::Error));
        assert_eq!(map.map("CANCELED"), Some(JobStatus::Canceled));
    }

    #[test]
    fn intermediate_states_collapse() {
        let map = StateMap::default();
        assert_eq!(map.map("STARTING"), Some(JobStatus::Queued));
        assert_eq!(map.map("CANCELING"), Some(JobStatus::Running));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let map = StateMap::default();
        assert_eq!(map.map("succeeded"), Some(JobStatus::Finished));
        assert_eq!(map.map("Running"), Some(JobStatus::Running));
    }

    #[test]
    fn unknown_state_maps_to_none() {
        let map = StateMap::default();
        assert_eq!(map.map("PONDERING"), None);
    }

    #[test]
    fn custom_entries_override_defaults() {
        let map = StateMap::default().with("STARTING", JobStatus::Running);
        assert_eq!(map.map("starting"), Some(JobStatus::Running));
    }
}
