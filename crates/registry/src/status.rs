//! Job lifecycle status enum and transition table.
//!
//! `Created → Queued → Running → {Finished | Error | Canceled}`.
//! Terminal states absorb: there is no way to resurrect a finished,
//! errored, or canceled job. The numeric ids match the seed data order
//! (1-based) of the `job_statuses` lookup table in Postgres.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Lifecycle status of a job.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created = 1,
    Queued = 2,
    Running = 3,
    Finished = 4,
    Error = 5,
    Canceled = 6,
}

impl JobStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Created),
            2 => Some(Self::Queued),
            3 => Some(Self::Running),
            4 => Some(Self::Finished),
            5 => Some(Self::Error),
            6 => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Wire name of the status, as serialized in API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Canceled)
    }

    /// Whether the state machine permits a transition from `self` to `to`.
    ///
    /// Allowed transitions:
    /// - `Created → Queued` (successful submission)
    /// - `Created → Error` (submission failure, recorded not dropped)
    /// - `Queued → Running`
    /// - `Queued → Finished` (poll cadence missed the running window)
    /// - `Queued → Error` (backend failed the job before it ran)
    /// - `Running → Finished`
    /// - `Running → Error`
    /// - `{Created, Queued, Running} → Canceled` (explicit cancel)
    pub fn can_transition_to(self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, to),
            (Created, Queued)
                | (Created, Error)
                | (Queued, Running)
                | (Queued, Finished)
                | (Queued, Error)
                | (Running, Finished)
                | (Running, Error)
                | (Created, Canceled)
                | (Queued, Canceled)
                | (Running, Canceled)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 6] = [
        JobStatus::Created,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Finished,
        JobStatus::Error,
        JobStatus::Canceled,
    ];

    #[test]
    fn status_ids_match_seed_data() {
        assert_eq!(JobStatus::Created.id(), 1);
        assert_eq!(JobStatus::Queued.id(), 2);
        assert_eq!(JobStatus::Running.id(), 3);
        assert_eq!(JobStatus::Finished.id(), 4);
        assert_eq!(JobStatus::Error.id(), 5);
        assert_eq!(JobStatus::Canceled.id(), 6);
    }

    #[test]
    fn from_id_round_trips() {
        for status in ALL {
            assert_eq!(JobStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(JobStatus::from_id(0), None);
        assert_eq!(JobStatus::from_id(7), None);
    }

    #[test]
    fn terminal_states_allow_no_transitions() {
        for from in [JobStatus::Finished, JobStatus::Error, JobStatus::Canceled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(JobStatus::Created.can_transition_to(JobStatus::Queued));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Finished));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Error));
    }

    #[test]
    fn queued_can_skip_running_when_polling_misses_it() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Finished));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Error));
    }

    #[test]
    fn cancel_reachable_only_from_non_terminal() {
        assert!(JobStatus::Created.can_transition_to(JobStatus::Canceled));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Canceled));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Canceled));
        assert!(!JobStatus::Finished.can_transition_to(JobStatus::Canceled));
        assert!(!JobStatus::Error.can_transition_to(JobStatus::Canceled));
    }

    #[test]
    fn no_skipping_or_reversing() {
        assert!(!JobStatus::Created.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Created.can_transition_to(JobStatus::Finished));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Created));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn wire_names_are_lowercase() {
        let json = serde_json::to_string(&JobStatus::Finished).unwrap();
        assert_eq!(json, "\"finished\"");
        let back: JobStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(back, JobStatus::Canceled);
    }
}
