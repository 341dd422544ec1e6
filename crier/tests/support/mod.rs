//! Shared doubles for exercising delivery runs.
#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use crier::NewCampaign;
use crier_store::{
    Job, JobId, JobStore, MemoryStore, Recipient, RunProgress, Segment, StoreError,
};
use crier_transport::{
    EmailMessage, SmtpConfig, SmtpTls, Transport, TransportConfig, TransportError,
};
use tokio::sync::{Semaphore, mpsc};

pub fn recipients(count: usize) -> Vec<Recipient> {
    (0..count)
        .map(|i| Recipient {
            id: format!("guest-{i}"),
            email: format!("guest{i}@example.com"),
            name: format!("First{i} Last{i}"),
        })
        .collect()
}

pub fn smtp_transport() -> TransportConfig {
    TransportConfig::Smtp(SmtpConfig {
        host: "localhost".to_string(),
        port: 1025,
        username: None,
        password: None,
        from: "news@example.com".to_string(),
        tls: SmtpTls::None,
        timeout_secs: 5,
    })
}

pub fn campaign(count: usize) -> NewCampaign {
    NewCampaign {
        segment: Segment::CheckedIn,
        subject: "Hello {{first_name}}".to_string(),
        html_body: "<p>Hi {{name}}, see you soon.</p>".to_string(),
        layout: None,
        transport: smtp_transport(),
        recipients: recipients(count),
        template_id: None,
        integration_id: None,
    }
}

/// Transport whose sends block until the test hands out permits, reporting
/// each arrival as it happens. Lets a test freeze a batch mid-flight.
pub struct GatedTransport {
    permits: Arc<Semaphore>,
    arrivals: mpsc::UnboundedSender<String>,
    sent: Mutex<Vec<String>>,
}

impl GatedTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>, Arc<Semaphore>) {
        let permits = Arc::new(Semaphore::new(0));
        let (arrivals, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            permits: Arc::clone(&permits),
            arrivals,
            sent: Mutex::new(Vec::new()),
        });
        (transport, rx, permits)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let _ = self.arrivals.send(message.to.clone());

        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        permit.forget();

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to.clone());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "gated"
    }
}

/// Job store wrapper that records every progress write as it passes
/// through.
pub struct RecordingStore {
    inner: Arc<MemoryStore>,
    progress: Mutex<Vec<RunProgress>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            progress: Mutex::new(Vec::new()),
        }
    }

    pub fn progress_writes(&self) -> Vec<RunProgress> {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.create(job).await
    }

    async fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.get(id).await
    }

    async fn claim_for_run(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.claim_for_run(id).await
    }

    async fn mark_cancelled(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.mark_cancelled(id).await
    }

    async fn reset_for_retry(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.reset_for_retry(id).await
    }

    async fn record_progress(&self, id: &JobId, progress: RunProgress) -> Result<Job, StoreError> {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(progress);
        self.inner.record_progress(id, progress).await
    }

    async fn complete_run(&self, id: &JobId, outcome: crier_store::JobStatus) -> Result<Job, StoreError> {
        self.inner.complete_run(id, outcome).await
    }
}

/// Job store wrapper whose progress writes start failing after a set
/// number of successes.
pub struct FlakyProgressStore {
    inner: Arc<MemoryStore>,
    successes_left: Mutex<u32>,
}

impl FlakyProgressStore {
    pub fn new(inner: Arc<MemoryStore>, successes: u32) -> Self {
        Self {
            inner,
            successes_left: Mutex::new(successes),
        }
    }
}

#[async_trait]
impl JobStore for FlakyProgressStore {
    async fn create(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.create(job).await
    }

    async fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.get(id).await
    }

    async fn claim_for_run(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.claim_for_run(id).await
    }

    async fn mark_cancelled(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.mark_cancelled(id).await
    }

    async fn reset_for_retry(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner.reset_for_retry(id).await
    }

    async fn record_progress(&self, id: &JobId, progress: RunProgress) -> Result<Job, StoreError> {
        {
            let mut left = self
                .successes_left
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *left == 0 {
                return Err(StoreError::Io(std::io::Error::other("disk unplugged")));
            }
            *left -= 1;
        }
        self.inner.record_progress(id, progress).await
    }

    async fn complete_run(&self, id: &JobId, outcome: crier_store::JobStatus) -> Result<Job, StoreError> {
        self.inner.complete_run(id, outcome).await
    }
}
