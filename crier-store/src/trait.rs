//! Persistence seams between the engine and its durable state.

use async_trait::async_trait;

use crate::{
    error::Result,
    job::{Job, JobStatus, RunProgress},
    send::{SendRecord, SendTally},
    types::{JobId, SendId},
};

/// Durable store for campaign jobs.
///
/// Every lifecycle-sensitive mutation is a single method so implementations
/// can make the read-check-write atomic. The runner never performs a
/// read-modify-write across calls for a status transition; the store's
/// transition methods are the at-most-one-active-run guarantee.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a freshly created job.
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// if the id is taken.
    async fn create(&self, job: Job) -> Result<Job>;

    /// Fetch a job by id.
    ///
    /// # Errors
    /// Returns [`StoreError::JobNotFound`](crate::StoreError::JobNotFound)
    /// if absent.
    async fn get(&self, id: &JobId) -> Result<Job>;

    /// Atomically move the job to `Running` and hand it to a run.
    ///
    /// Accepted from `Pending` or `Partial` only. Sets `started_at` when
    /// unset, zeroes the cursor, and refreshes the heartbeat.
    ///
    /// # Errors
    /// Returns an invalid-transition error when the job is in any other
    /// state, which is how a second concurrent start observes defeat.
    async fn claim_for_run(&self, id: &JobId) -> Result<Job>;

    /// Atomically cancel the job, stamping `completed_at` immediately.
    ///
    /// Accepted from `Pending`, `Running`, or `Partial`. An active run is
    /// not interrupted; it observes the status at its next batch boundary.
    ///
    /// # Errors
    /// Returns an invalid-transition error from any other state.
    async fn mark_cancelled(&self, id: &JobId) -> Result<Job>;

    /// Atomically reset a `Partial` or `Failed` job to `Pending`.
    ///
    /// The cursor and `failed_count` return to zero and `completed_at`
    /// clears. `sent_count` and `started_at` survive; retry never forgets
    /// what was already delivered.
    ///
    /// # Errors
    /// Returns an invalid-transition error from any other state.
    async fn reset_for_retry(&self, id: &JobId) -> Result<Job>;

    /// Overwrite the aggregate counters and cursor, refreshing the
    /// heartbeat.
    ///
    /// # Errors
    /// Rejects writes that would break `sent + failed <= total_contacts`.
    async fn record_progress(&self, id: &JobId, progress: RunProgress) -> Result<Job>;

    /// Record a run's terminal outcome, stamping `completed_at`.
    ///
    /// If a cancel won the race and the job already reads `Cancelled`, the
    /// stored job is returned unchanged: a cancellation is never overwritten
    /// by a computed outcome.
    ///
    /// # Errors
    /// Rejects non-terminal outcomes and jobs not currently `Running`.
    async fn complete_run(&self, id: &JobId, outcome: JobStatus) -> Result<Job>;
}

/// Durable per-recipient send ledger.
///
/// Row writes are immediately durable: a crash between batches loses no
/// individual delivery outcome.
#[async_trait]
pub trait SendLedger: Send + Sync {
    /// Bulk-insert the rows for a freshly created job.
    async fn create_many(&self, records: Vec<SendRecord>) -> Result<()>;

    /// Every row belonging to the job, oldest first.
    async fn for_job(&self, job_id: &JobId) -> Result<Vec<SendRecord>>;

    /// Rows still `Pending` for the job, oldest first. The ordering is a
    /// fairness guarantee, not a correctness requirement.
    async fn pending_for_job(&self, job_id: &JobId) -> Result<Vec<SendRecord>>;

    /// Mark a pending row delivered: stamps `sent_at` and bumps `attempts`.
    ///
    /// # Errors
    /// Rejects rows not currently `Pending`; a delivered row is never
    /// re-delivered.
    async fn mark_sent(&self, id: &SendId) -> Result<SendRecord>;

    /// Mark a pending row failed, recording the delivery error and bumping
    /// `attempts`.
    ///
    /// # Errors
    /// Rejects rows not currently `Pending`.
    async fn mark_failed(&self, id: &SendId, error: &str) -> Result<SendRecord>;

    /// Record an asynchronous bounce report for a row that was handed off
    /// successfully. Fed by provider webhooks, never called by the runner.
    ///
    /// # Errors
    /// Rejects rows not currently `Sent`.
    async fn mark_bounced(&self, id: &SendId) -> Result<SendRecord>;

    /// Reset every `Failed` row of the job to `Pending`, clearing errors
    /// while preserving attempt counts. Returns how many rows were reset.
    async fn reset_failed(&self, job_id: &JobId) -> Result<u64>;

    /// Per-status row counts for the job.
    async fn tally(&self, job_id: &JobId) -> Result<SendTally>;
}
