pub mod backends;
pub mod error;
pub mod job;
pub mod send;
pub mod r#trait;
pub mod types;

pub use backends::MemoryStore;
pub use error::{Result, StoreError};
pub use job::{Job, JobStatus, RunProgress, Segment};
pub use send::{Recipient, SendRecord, SendStatus, SendTally};
pub use r#trait::{JobStore, SendLedger};
pub use types::{JobId, SendId};
