use std::sync::Arc;

use crier_render::MessageTemplate;
use crier_store::{
    Job, JobId, JobStore, Recipient, Segment, SendId, SendLedger, SendRecord, SendTally,
};
use crier_transport::{TransportConfig, TransportFactory};
use serde::Deserialize;

use crate::{
    config::{DispatchConfig, JobConfig},
    dispatcher::Dispatcher,
    error::{PreconditionError, Result},
};

/// Campaign intake: an already-resolved recipient list plus the message and
/// provider settings its runs will use.
///
/// Segment resolution happens upstream; by the time a campaign reaches the
/// engine the audience is a concrete list.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub segment: Segment,
    pub subject: String,
    pub html_body: String,
    #[serde(default)]
    pub layout: Option<String>,
    pub transport: TransportConfig,
    pub recipients: Vec<Recipient>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub integration_id: Option<String>,
}

/// A job together with all of its ledger rows.
#[derive(Debug, Clone)]
pub struct CampaignSnapshot {
    pub job: Job,
    pub sends: Vec<SendRecord>,
}

/// Operational surface for campaign jobs: create, start, cancel, retry,
/// and inspect.
#[derive(Clone)]
pub struct Campaigns {
    jobs: Arc<dyn JobStore>,
    ledger: Arc<dyn SendLedger>,
    dispatcher: Dispatcher,
}

impl Campaigns {
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        ledger: Arc<dyn SendLedger>,
        transports: Arc<dyn TransportFactory>,
        config: DispatchConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&jobs), Arc::clone(&ledger), transports, config);
        Self {
            jobs,
            ledger,
            dispatcher,
        }
    }

    /// Create a pending job and one ledger row per recipient.
    ///
    /// # Errors
    ///
    /// Rejects an empty recipient list, and surfaces store failures.
    pub async fn create(&self, campaign: NewCampaign) -> Result<Job> {
        if campaign.recipients.is_empty() {
            return Err(PreconditionError::EmptySegment {
                segment: campaign.segment.to_string(),
            }
            .into());
        }

        let config = JobConfig {
            transport: campaign.transport,
            template: MessageTemplate {
                subject: campaign.subject,
                html_body: campaign.html_body,
                layout: campaign.layout,
            },
            template_id: campaign.template_id,
            integration_id: campaign.integration_id,
        };

        let total = campaign.recipients.len() as u64;
        let job = Job::new(campaign.segment, total, config.to_value()?);
        let job = self.jobs.create(job).await?;

        let rows = campaign
            .recipients
            .iter()
            .map(|recipient| SendRecord::for_recipient(job.id.clone(), recipient))
            .collect();
        self.ledger.create_many(rows).await?;

        tracing::info!(job = %job.id, segment = %job.segment, total, "campaign created");

        Ok(job)
    }

    /// Run the campaign to completion on the calling task.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::run`].
    pub async fn start(&self, id: &JobId) -> Result<Job> {
        self.dispatcher.run(id).await
    }

    /// Request cancellation. An active run stops at its next batch
    /// boundary; a job that has not started never will.
    ///
    /// # Errors
    ///
    /// Rejected for jobs already settled as completed, failed, or
    /// cancelled.
    pub async fn cancel(&self, id: &JobId) -> Result<Job> {
        let job = self.jobs.mark_cancelled(id).await?;
        tracing::info!(job = %job.id, "campaign cancelled");
        Ok(job)
    }

    /// Queue a partial or failed campaign for another delivery pass.
    ///
    /// The job returns to pending with its failure count cleared, and every
    /// failed ledger row becomes pending again with its error wiped and its
    /// attempt count kept. Rows already sent are untouched, so a rerun only
    /// contacts recipients whose delivery failed.
    ///
    /// # Errors
    ///
    /// Rejected unless the job is partial or failed.
    pub async fn retry(&self, id: &JobId) -> Result<Job> {
        let job = self.jobs.reset_for_retry(id).await?;
        let reset = self.ledger.reset_failed(id).await?;
        tracing::info!(job = %job.id, reset, "campaign queued for retry");
        Ok(job)
    }

    /// The job and all of its ledger rows.
    ///
    /// # Errors
    ///
    /// Returns an error when the job does not exist.
    pub async fn snapshot(&self, id: &JobId) -> Result<CampaignSnapshot> {
        let job = self.jobs.get(id).await?;
        let sends = self.ledger.for_job(id).await?;
        Ok(CampaignSnapshot { job, sends })
    }

    /// Ledger counts by status.
    ///
    /// # Errors
    ///
    /// Returns an error when the job does not exist.
    pub async fn tally(&self, id: &JobId) -> Result<SendTally> {
        // existence check, so an unknown id reads as such instead of zeros
        self.jobs.get(id).await?;
        Ok(self.ledger.tally(id).await?)
    }

    /// Record an out-of-band bounce report for a delivered send.
    ///
    /// Bounce reports arrive from provider webhooks or mailbox scans long
    /// after a run finished; they only ever downgrade a sent row.
    ///
    /// # Errors
    ///
    /// Rejected unless the send exists and is currently sent.
    pub async fn record_bounce(&self, id: &SendId) -> Result<SendRecord> {
        let record = self.ledger.mark_bounced(id).await?;
        tracing::info!(send = %record.id, to = %record.email, "bounce recorded");
        Ok(record)
    }
}
