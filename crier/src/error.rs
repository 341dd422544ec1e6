use crier_store::{JobId, JobStatus, SendId, SendStatus, StoreError};
use crier_transport::TransportError;
use thiserror::Error;

/// Convenience alias for campaign operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Failures resolving a job's stored configuration into run inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The stored configuration does not decode into transport and
    /// template settings.
    #[error("job configuration does not decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured provider refused to connect.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Control operations arriving in a state that does not accept them.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// Campaign creation with no recipients.
    #[error("segment {segment} resolved to no recipients")]
    EmptySegment { segment: String },

    /// The job does not exist.
    #[error("unknown job {0}")]
    UnknownJob(JobId),

    /// The send does not exist.
    #[error("unknown send {0}")]
    UnknownSend(SendId),

    /// The job's current status rejects the requested move.
    #[error("job {id} is {from}, cannot move to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// The send's current status rejects the requested move.
    #[error("send {id} is {from}, cannot move to {to}")]
    SendTransition {
        id: SendId,
        from: SendStatus,
        to: SendStatus,
    },
}

/// Top-level error for campaign operations and delivery runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The store broke underneath an operation or a run.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl DispatchError {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<StoreError> for DispatchError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::JobNotFound(id) => Self::Precondition(PreconditionError::UnknownJob(id)),
            StoreError::SendNotFound(id) => Self::Precondition(PreconditionError::UnknownSend(id)),
            StoreError::InvalidTransition { id, from, to } => {
                Self::Precondition(PreconditionError::InvalidTransition { id, from, to })
            }
            StoreError::SendTransition { id, from, to } => {
                Self::Precondition(PreconditionError::SendTransition { id, from, to })
            }
            other => Self::Store(other),
        }
    }
}
