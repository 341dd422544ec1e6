//! Batched email campaign dispatch.
//!
//! A campaign is a [`Job`](crier_store::Job) plus one ledger row per
//! recipient. The [`Dispatcher`] claims a pending job, resolves its
//! transport and template once, and delivers the pending rows oldest first
//! in fixed batches: sends inside a batch run concurrently, progress
//! persists at every batch boundary, and a cancellation is picked up
//! between batches. [`Campaigns`] is the operational surface on top:
//! create, start, cancel, retry, and inspect.

pub mod campaigns;
pub mod config;
pub mod dispatcher;
pub mod error;

pub use campaigns::{CampaignSnapshot, Campaigns, NewCampaign};
pub use config::{DispatchConfig, JobConfig};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, DispatchError, PreconditionError, Result};
