use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    error::{Result, StoreError},
    job::{Job, JobStatus, RunProgress},
    send::{SendRecord, SendStatus, SendTally},
    r#trait::{JobStore, SendLedger},
    types::{JobId, SendId},
};

/// In-memory store backing both the job table and the send ledger.
///
/// Rows live in `DashMap`s, and every check-and-set runs while holding the
/// entry's shard write guard, which is what makes the lifecycle transitions
/// atomic: a second concurrent claim cannot interleave between the status
/// read and the status write.
///
/// Intended for tests and single-process deployments. Durable backends
/// implement the same two traits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    jobs: Arc<DashMap<JobId, Job>>,
    sends: Arc<DashMap<SendId, SendRecord>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rows_where(&self, job_id: &JobId, predicate: impl Fn(&SendRecord) -> bool) -> Vec<SendRecord> {
        let mut rows: Vec<SendRecord> = self
            .sends
            .iter()
            .filter(|entry| entry.value().job_id == *job_id && predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // oldest first; ids break ties between same-instant rows
        rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

        rows
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: Job) -> Result<Job> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(job.id)),
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
                Ok(job)
            }
        }
    }

    async fn get(&self, id: &JobId) -> Result<Job> {
        self.jobs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))
    }

    async fn claim_for_run(&self, id: &JobId) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let job = entry.value_mut();

        if !job.status.can_start() {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Running,
            });
        }

        let now = Utc::now();
        job.status = JobStatus::Running;
        if job.started_at.is_none() {
            job.started_at = Some(now);
        }
        job.cursor = 0;
        job.last_heartbeat = Some(now);

        Ok(job.clone())
    }

    async fn mark_cancelled(&self, id: &JobId) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let job = entry.value_mut();

        if !job.status.can_cancel() {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Cancelled,
            });
        }

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());

        Ok(job.clone())
    }

    async fn reset_for_retry(&self, id: &JobId) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let job = entry.value_mut();

        if !job.status.can_retry() {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Pending,
            });
        }

        job.status = JobStatus::Pending;
        job.cursor = 0;
        job.failed_count = 0;
        job.completed_at = None;

        Ok(job.clone())
    }

    async fn record_progress(&self, id: &JobId, progress: RunProgress) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let job = entry.value_mut();

        if progress.sent.saturating_add(progress.failed) > job.total_contacts {
            return Err(StoreError::Internal(format!(
                "progress for job {id} exceeds total contacts: {} sent + {} failed > {}",
                progress.sent, progress.failed, job.total_contacts
            )));
        }

        job.sent_count = progress.sent;
        job.failed_count = progress.failed;
        job.cursor = progress.cursor;
        job.last_heartbeat = Some(Utc::now());

        Ok(job.clone())
    }

    async fn complete_run(&self, id: &JobId, outcome: JobStatus) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let job = entry.value_mut();

        // A cancel that landed after the runner's last status probe wins.
        if job.status == JobStatus::Cancelled {
            return Ok(job.clone());
        }

        if job.status != JobStatus::Running || !outcome.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to: outcome,
            });
        }

        job.status = outcome;
        job.completed_at = Some(Utc::now());

        Ok(job.clone())
    }
}

#[async_trait]
impl SendLedger for MemoryStore {
    async fn create_many(&self, records: Vec<SendRecord>) -> Result<()> {
        for record in records {
            match self.sends.entry(record.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(StoreError::Internal(format!(
                        "send {} already exists",
                        record.id
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }
        Ok(())
    }

    async fn for_job(&self, job_id: &JobId) -> Result<Vec<SendRecord>> {
        Ok(self.rows_where(job_id, |_| true))
    }

    async fn pending_for_job(&self, job_id: &JobId) -> Result<Vec<SendRecord>> {
        Ok(self.rows_where(job_id, |row| row.status == SendStatus::Pending))
    }

    async fn mark_sent(&self, id: &SendId) -> Result<SendRecord> {
        let mut entry = self
            .sends
            .get_mut(id)
            .ok_or_else(|| StoreError::SendNotFound(id.clone()))?;
        let row = entry.value_mut();

        if row.status != SendStatus::Pending {
            return Err(StoreError::SendTransition {
                id: id.clone(),
                from: row.status,
                to: SendStatus::Sent,
            });
        }

        row.status = SendStatus::Sent;
        row.sent_at = Some(Utc::now());
        row.attempts = row.attempts.saturating_add(1);

        Ok(row.clone())
    }

    async fn mark_failed(&self, id: &SendId, error: &str) -> Result<SendRecord> {
        let mut entry = self
            .sends
            .get_mut(id)
            .ok_or_else(|| StoreError::SendNotFound(id.clone()))?;
        let row = entry.value_mut();

        if row.status != SendStatus::Pending {
            return Err(StoreError::SendTransition {
                id: id.clone(),
                from: row.status,
                to: SendStatus::Failed,
            });
        }

        row.status = SendStatus::Failed;
        row.error = Some(error.to_string());
        row.attempts = row.attempts.saturating_add(1);

        Ok(row.clone())
    }

    async fn mark_bounced(&self, id: &SendId) -> Result<SendRecord> {
        let mut entry = self
            .sends
            .get_mut(id)
            .ok_or_else(|| StoreError::SendNotFound(id.clone()))?;
        let row = entry.value_mut();

        if row.status != SendStatus::Sent {
            return Err(StoreError::SendTransition {
                id: id.clone(),
                from: row.status,
                to: SendStatus::Bounced,
            });
        }

        row.status = SendStatus::Bounced;

        Ok(row.clone())
    }

    async fn reset_failed(&self, job_id: &JobId) -> Result<u64> {
        let mut reset = 0u64;
        for mut entry in self.sends.iter_mut() {
            let row = entry.value_mut();
            if row.job_id == *job_id && row.status == SendStatus::Failed {
                // attempts survive the reset; only the outcome is forgotten
                row.status = SendStatus::Pending;
                row.error = None;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn tally(&self, job_id: &JobId) -> Result<SendTally> {
        let mut tally = SendTally::default();
        for entry in self.sends.iter() {
            let row = entry.value();
            if row.job_id != *job_id {
                continue;
            }
            match row.status {
                SendStatus::Pending => tally.pending += 1,
                SendStatus::Sent => tally.sent += 1,
                SendStatus::Failed => tally.failed += 1,
                SendStatus::Bounced => tally.bounced += 1,
            }
        }
        Ok(tally)
    }
}
