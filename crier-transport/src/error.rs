use thiserror::Error;

/// Convenience alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while connecting a provider or delivering a message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An address failed to parse.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The message itself could not be assembled.
    #[error("failed to build message: {0}")]
    Build(String),

    /// The provider could not be reached, or the exchange broke off.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The provider refused the message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// An HTTP provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// The provider settings are unusable.
    #[error("transport configuration invalid: {0}")]
    Configuration(String),
}

impl TransportError {
    /// Whether retrying the same message later is pointless.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        match self {
            Self::InvalidAddress(_) | Self::Build(_) | Self::Rejected(_) => true,
            Self::Provider { status, .. } => *status < 500,
            Self::Connection(_) | Self::Configuration(_) => false,
        }
    }

    /// Whether the failure may clear on its own.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        !self.is_permanent()
    }
}
