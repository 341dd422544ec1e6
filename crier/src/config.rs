use crier_render::MessageTemplate;
use crier_transport::TransportConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Everything a delivery run needs, decoded from the job's stored
/// configuration.
///
/// Jobs carry this as an opaque JSON value so the store never grows
/// provider- or template-specific columns; a run decodes it once at claim
/// time and fails the job if it does not parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub transport: TransportConfig,
    pub template: MessageTemplate,
    /// Upstream template identifier, carried for bookkeeping only.
    #[serde(default)]
    pub template_id: Option<String>,
    /// Upstream integration identifier, carried for bookkeeping only.
    #[serde(default)]
    pub integration_id: Option<String>,
}

impl JobConfig {
    /// Decode a job's opaque configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the value does not hold transport and
    /// template settings.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Encode for storage on a job row.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings do not serialize.
    pub fn to_value(&self) -> Result<serde_json::Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Runner tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Sends per batch. Progress persists at batch boundaries, and
    /// cancellation is observed between batches, so smaller batches mean
    /// fresher counters and faster cancels at the cost of more store
    /// writes.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

const fn default_batch_size() -> usize {
    10
}
