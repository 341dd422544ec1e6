//! Campaign job records and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// Lifecycle state of a campaign job.
///
/// A job moves from `Pending` to `Running` when a run claims it, and from
/// `Running` into one of the terminal states when the run finishes. The
/// retry operation moves `Partial` and `Failed` jobs back to `Pending` for
/// another cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet claimed by a run.
    Pending,
    /// A run is (or was, if it crashed) actively delivering.
    Running,
    /// The run finished with some sends delivered and some failed.
    Partial,
    /// Every send was delivered.
    Completed,
    /// The run finished without a single successful delivery, or aborted
    /// before delivery began.
    Failed,
    /// Cancelled by an operator; any active run stops at its next batch
    /// boundary.
    Cancelled,
}

impl JobStatus {
    /// Returns `true` for states no run will leave on its own.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Partial | Self::Completed | Self::Failed | Self::Cancelled
        )
    }

    /// States from which a run may claim the job.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }

    /// States from which the cancel operation is accepted.
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Running | Self::Partial)
    }

    /// States from which the retry operation is accepted.
    #[must_use]
    pub const fn can_retry(self) -> bool {
        matches!(self, Self::Partial | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Partial => "partial",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Recipient-class tag the campaign was created for.
///
/// Informational only: the upstream caller resolves the segment to a concrete
/// recipient list before the job exists, and the engine never re-queries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    CheckedIn,
    NoShow,
    Waitlist,
    Custom,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CheckedIn => "checked_in",
            Self::NoShow => "no_show",
            Self::Waitlist => "waitlist",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Aggregate counters persisted after each delivery batch.
///
/// Values are absolute, not deltas: the runner owns the arithmetic and the
/// store applies the write as-is. Last write wins, which is safe because at
/// most one run is ever active per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub sent: u64,
    pub failed: u64,
    pub cursor: u64,
}

/// One campaign invocation.
///
/// Carries cached aggregate counters for cheap progress reads (the send
/// ledger remains the source of truth), the lifecycle status gating every
/// control operation, and the opaque configuration a run resolves at claim
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub segment: Segment,
    pub status: JobStatus,
    /// Number of ledger rows created for this job. Never changes.
    pub total_contacts: u64,
    pub sent_count: u64,
    pub failed_count: u64,
    /// Progress-report offset into the pending scan. May be reset freely:
    /// resumption is driven by ledger row status, never by this value.
    pub cursor: u64,
    /// Transport selection and render inputs, opaque at this layer.
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Set by the first claim and preserved across retries, so elapsed time
    /// over the whole retry history stays observable.
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Refreshed after every batch while running; external monitors use it
    /// to spot a stalled run.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a pending job with zeroed counters.
    #[must_use]
    pub fn new(segment: Segment, total_contacts: u64, config: serde_json::Value) -> Self {
        Self {
            id: JobId::generate(),
            segment,
            status: JobStatus::Pending,
            total_contacts,
            sent_count: 0,
            failed_count: 0,
            cursor: 0,
            config,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            last_heartbeat: None,
        }
    }
}
