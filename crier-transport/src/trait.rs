use std::sync::Arc;

use async_trait::async_trait;

use crate::{config::TransportConfig, error::Result, message::EmailMessage};

/// A connected email delivery channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider rejects the message or cannot be
    /// reached. A delivery error never poisons the transport; the caller may
    /// keep sending.
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Short provider label used in logs.
    fn kind(&self) -> &'static str;
}

/// Resolves provider settings into a live [`Transport`].
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Connect the provider named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are unusable or the provider
    /// client cannot be constructed.
    async fn connect(&self, config: &TransportConfig) -> Result<Arc<dyn Transport>>;
}
