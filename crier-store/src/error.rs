//! Error types for job and send-ledger storage.

use thiserror::Error;

use crate::{
    job::JobStatus,
    send::SendStatus,
    types::{JobId, SendId},
};

/// Top-level storage error.
///
/// Lifecycle-transition rejections carry both ends of the refused edge so
/// callers can report exactly which precondition failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No job with this id.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// No ledger row with this id.
    #[error("send not found: {0}")]
    SendNotFound(SendId),

    /// A job with this id is already stored.
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),

    /// The job's current status does not permit the requested transition.
    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// The ledger row's current status does not permit the requested
    /// transition.
    #[error("send {id} cannot move from {from} to {to}")]
    SendTransition {
        id: SendId,
        from: SendStatus,
        to: SendStatus,
    },

    /// I/O failure in a durable backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal storage error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
