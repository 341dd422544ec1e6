use std::sync::Arc;

use crier_render::{MessageTemplate, recipient_vars, render};
use crier_store::{
    Job, JobId, JobStatus, JobStore, RunProgress, SendLedger, SendRecord, StoreError,
};
use crier_transport::{EmailMessage, Transport, TransportFactory};
use tokio::task::JoinSet;

use crate::{
    config::{DispatchConfig, JobConfig},
    error::{ConfigError, DispatchError, Result},
};

/// Claims campaign jobs and walks their send ledgers in fixed batches.
///
/// One dispatcher serves any number of jobs; each [`run`](Self::run) call
/// drives a single job to a terminal status. Sends inside a batch are
/// delivered concurrently, batches themselves run in order, and every batch
/// boundary persists progress and checks for cancellation.
#[derive(Clone)]
pub struct Dispatcher {
    jobs: Arc<dyn JobStore>,
    ledger: Arc<dyn SendLedger>,
    transports: Arc<dyn TransportFactory>,
    batch_size: usize,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        ledger: Arc<dyn SendLedger>,
        transports: Arc<dyn TransportFactory>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            jobs,
            ledger,
            transports,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Execute one delivery run for `id`.
    ///
    /// The claim is atomic: of any number of concurrent calls for the same
    /// job, exactly one proceeds. The run resolves the transport and
    /// template once, then delivers pending ledger rows oldest first. A
    /// send failure marks its row and moves on; it never aborts the run.
    /// The returned job carries the terminal status derived from the final
    /// counters, or `Cancelled` when a cancel was observed.
    ///
    /// # Errors
    ///
    /// Returns an error when the claim is rejected or the store breaks
    /// mid-run. A configuration or transport-resolution failure also
    /// surfaces as an error, after settling the job as failed with no
    /// sends attempted.
    #[tracing::instrument(skip_all, fields(job = %id))]
    pub async fn run(&self, id: &JobId) -> Result<Job> {
        let job = self.jobs.claim_for_run(id).await?;
        tracing::info!(segment = %job.segment, total = job.total_contacts, "run claimed");

        let (transport, template) = match self.resolve_inputs(&job).await {
            Ok(inputs) => inputs,
            Err(e) => return self.fail_run(id, e).await,
        };

        let pending = match self.ledger.pending_for_job(id).await {
            Ok(pending) => pending,
            Err(e) => return self.fail_run(id, e.into()).await,
        };

        let mut sent = job.sent_count;
        let mut failed = job.failed_count;
        let mut cursor = 0u64;
        let mut observed_cancel = false;

        for batch in pending.chunks(self.batch_size) {
            // a cancel is picked up here, so it lags by at most one batch
            if self.jobs.get(id).await?.status == JobStatus::Cancelled {
                observed_cancel = true;
                break;
            }

            let (batch_sent, batch_failed) = self
                .deliver_batch(Arc::clone(&transport), &template, batch)
                .await?;

            sent += batch_sent;
            failed += batch_failed;
            cursor += batch.len() as u64;

            self.jobs
                .record_progress(id, RunProgress { sent, failed, cursor })
                .await?;

            tracing::debug!(sent, failed, cursor, "batch recorded");
        }

        let outcome = if observed_cancel {
            JobStatus::Cancelled
        } else {
            terminal_status(sent, failed)
        };

        let finished = self.jobs.complete_run(id, outcome).await?;
        tracing::info!(status = %finished.status, sent, failed, "run finished");
        Ok(finished)
    }

    async fn resolve_inputs(&self, job: &Job) -> Result<(Arc<dyn Transport>, MessageTemplate)> {
        let config = JobConfig::from_value(&job.config)?;

        let transport = self
            .transports
            .connect(&config.transport)
            .await
            .map_err(|e| {
                tracing::warn!(
                    kind = config.transport.kind(),
                    error = %e,
                    "transport resolution failed"
                );
                DispatchError::from(ConfigError::Transport(e))
            })?;

        Ok((transport, config.template))
    }

    /// Settle a run that broke before any delivery was attempted.
    async fn fail_run(&self, id: &JobId, error: DispatchError) -> Result<Job> {
        tracing::warn!(error = %error, "run aborted before delivery");
        if let Err(settle) = self.jobs.complete_run(id, JobStatus::Failed).await {
            tracing::warn!(error = %settle, "failed to settle aborted run");
        }
        Err(error)
    }

    async fn deliver_batch(
        &self,
        transport: Arc<dyn Transport>,
        template: &MessageTemplate,
        batch: &[SendRecord],
    ) -> Result<(u64, u64)> {
        let mut tasks: JoinSet<std::result::Result<bool, StoreError>> = JoinSet::new();

        for record in batch {
            let transport = Arc::clone(&transport);
            let ledger = Arc::clone(&self.ledger);
            let template = template.clone();
            let record = record.clone();
            tasks.spawn(async move { deliver_one(transport, ledger, &template, record).await });
        }

        let mut sent = 0u64;
        let mut failed = 0u64;
        let mut first_error: Option<StoreError> = None;

        // drain every task even after an error, so in-flight sends settle
        // their ledger rows before the run stops
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(true)) => sent += 1,
                Ok(Ok(false)) => failed += 1,
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error =
                            Some(StoreError::Internal(format!("delivery task panicked: {e}")));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok((sent, failed)),
        }
    }
}

/// Deliver one send and settle its ledger row.
///
/// `Ok(true)` counts a delivery, `Ok(false)` a marked failure. Only a store
/// write failure is an error.
async fn deliver_one(
    transport: Arc<dyn Transport>,
    ledger: Arc<dyn SendLedger>,
    template: &MessageTemplate,
    record: SendRecord,
) -> std::result::Result<bool, StoreError> {
    let vars = recipient_vars(&record.name, &record.email);
    let rendered = render(template, &vars);
    let message = EmailMessage {
        to: record.email.clone(),
        subject: rendered.subject,
        html_body: rendered.html_body,
    };

    match transport.send(&message).await {
        Ok(()) => {
            ledger.mark_sent(&record.id).await?;
            tracing::debug!(send = %record.id, to = %record.email, "delivered");
            Ok(true)
        }
        Err(e) => {
            ledger.mark_failed(&record.id, &e.to_string()).await?;
            tracing::warn!(
                send = %record.id,
                to = %record.email,
                permanent = e.is_permanent(),
                error = %e,
                "delivery failed"
            );
            Ok(false)
        }
    }
}

/// Terminal status from end-of-run counters: any mix of success and failure
/// is partial, failure without a single delivery is failed, everything else
/// completed.
const fn terminal_status(sent: u64, failed: u64) -> JobStatus {
    if failed > 0 {
        if sent > 0 {
            JobStatus::Partial
        } else {
            JobStatus::Failed
        }
    } else {
        JobStatus::Completed
    }
}
