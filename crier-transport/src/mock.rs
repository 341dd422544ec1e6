use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;

use crate::{
    config::TransportConfig,
    error::{Result, TransportError},
    message::EmailMessage,
    r#trait::{Transport, TransportFactory},
};

/// Test transport that records every message instead of delivering it.
///
/// Addresses registered through [`fail_for`](Self::fail_for) are rejected,
/// which is how suites stage partially failing and fully failing runs.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<EmailMessage>>,
    failures: Mutex<HashSet<String>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future send addressed to `email`.
    pub fn fail_for(&self, email: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(email.into());
    }

    /// Messages accepted so far, in acceptance order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let rejected = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&message.to);

        if rejected {
            return Err(TransportError::Rejected(format!(
                "mock rejection for {}",
                message.to
            )));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}

/// Factory that hands out one fixed transport, or refuses to connect.
#[derive(Default)]
pub struct MockFactory {
    transport: Option<Arc<dyn Transport>>,
}

impl MockFactory {
    /// Resolve every configuration to `transport`.
    #[must_use]
    pub fn returning(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    /// Refuse every connection attempt.
    #[must_use]
    pub fn refusing() -> Self {
        Self { transport: None }
    }
}

#[async_trait]
impl TransportFactory for MockFactory {
    async fn connect(&self, config: &TransportConfig) -> Result<Arc<dyn Transport>> {
        self.transport.clone().ok_or_else(|| {
            TransportError::Configuration(format!("no transport available for {}", config.kind()))
        })
    }
}
