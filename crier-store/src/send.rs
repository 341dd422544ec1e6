//! Per-recipient send-ledger rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{JobId, SendId};

/// Delivery state of a single ledger row.
///
/// Rows only move forward: `Pending` to `Sent` or `Failed` during a run, and
/// `Sent` to `Bounced` when a provider reports an asynchronous bounce. The
/// one backwards edge is the retry operation's `Failed` to `Pending` reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Pending,
    Sent,
    Failed,
    Bounced,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Bounced => "bounced",
        };
        f.write_str(name)
    }
}

/// A recipient as resolved by the upstream segment query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Upstream contact identifier, opaque here.
    pub id: String,
    pub email: String,
    pub name: String,
}

/// One (job, recipient) ledger row.
///
/// Created in bulk when the job is created and never deleted; the row is the
/// per-recipient audit trail of every delivery outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: SendId,
    pub job_id: JobId,
    pub recipient_id: String,
    pub email: String,
    /// Display name snapshotted at creation, so the render variable map can
    /// be derived from the row alone without reaching back into the contact
    /// system.
    pub name: String,
    pub status: SendStatus,
    /// Delivery attempts made for this row, accumulated across retries.
    pub attempts: u32,
    /// Last failure message; cleared when the row is reset to pending.
    pub error: Option<String>,
    /// Set only on successful hand-off to the transport.
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SendRecord {
    /// Build the pending row for one recipient of a job.
    #[must_use]
    pub fn for_recipient(job_id: JobId, recipient: &Recipient) -> Self {
        Self {
            id: SendId::generate(),
            job_id,
            recipient_id: recipient.id.clone(),
            email: recipient.email.clone(),
            name: recipient.name.clone(),
            status: SendStatus::Pending,
            attempts: 0,
            error: None,
            sent_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Per-status row counts for one job's ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SendTally {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
    pub bounced: u64,
}

impl SendTally {
    #[must_use]
    pub const fn total(self) -> u64 {
        self.pending + self.sent + self.failed + self.bounced
    }
}
