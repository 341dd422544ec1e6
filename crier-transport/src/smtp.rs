use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, SinglePart},
    transport::smtp::authentication::Credentials,
};

use crate::{
    config::{SmtpConfig, SmtpTls},
    error::{Result, TransportError},
    message::EmailMessage,
    r#trait::Transport,
};

/// SMTP relay delivery over a pooled `lettre` client.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    /// Build a pooled client for the configured relay.
    ///
    /// # Errors
    ///
    /// Returns an error when the sender address does not parse or the relay
    /// parameters are rejected by the client builder.
    pub fn connect(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("sender {}: {e}", config.from)))?;

        let builder = match config.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Connection(format!("relay {}: {e}", config.host)))?,
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::Connection(format!("relay {}: {e}", config.host)))?,
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let to: Mailbox = message.to.parse().map_err(|e| {
            TransportError::InvalidAddress(format!("recipient {}: {e}", message.to))
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .singlepart(SinglePart::html(message.html_body.clone()))
            .map_err(|e| TransportError::Build(e.to_string()))?;

        self.mailer.send(email).await.map(|_| ()).map_err(|e| {
            if e.is_permanent() {
                TransportError::Rejected(e.to_string())
            } else {
                TransportError::Connection(e.to_string())
            }
        })
    }

    fn kind(&self) -> &'static str {
        "smtp"
    }
}
