use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::TransportConfig,
    error::Result,
    http_api::HttpApiTransport,
    ses::SesTransport,
    smtp::SmtpTransport,
    r#trait::{Transport, TransportFactory},
};

/// Default factory connecting whichever provider the configuration names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderFactory;

impl ProviderFactory {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportFactory for ProviderFactory {
    async fn connect(&self, config: &TransportConfig) -> Result<Arc<dyn Transport>> {
        let transport: Arc<dyn Transport> = match config {
            TransportConfig::Smtp(smtp) => Arc::new(SmtpTransport::connect(smtp)?),
            TransportConfig::Ses(ses) => Arc::new(SesTransport::connect(ses).await?),
            TransportConfig::HttpApi(api) => Arc::new(HttpApiTransport::connect(api)?),
        };

        tracing::debug!(kind = transport.kind(), "transport connected");

        Ok(transport)
    }
}
