//! Aggregation configuration with sensible defaults.
//!
//! [`AggregateConfig`] controls the declustering pass of finalization and
//! the per-engine deadline used by the fan-out driver. It deserializes from
//! JSON with every field optional.

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Configuration for one aggregation.
///
/// Use [`Default::default()`] for the standard values, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// How far behind the end of the output an anchor may still accept
    /// grouped results.
    pub group_window: usize,
    /// How many results one anchor may pull in next to itself before a new
    /// anchor has to be started.
    pub group_quota: usize,
    /// Category assumed for engines that are unknown to the registry or
    /// declare no categories.
    pub default_category: String,
    /// Per-engine deadline in seconds, used only by
    /// [`aggregate`](crate::orchestrator::search::aggregate).
    pub timeout_seconds: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            group_window: 20,
            group_quota: 8,
            default_category: "general".into(),
            timeout_seconds: 8,
        }
    }
}

impl AggregateConfig {
    /// Parse a configuration from a JSON document. Missing fields take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Decode`] for malformed JSON and
    /// [`AggregateError::Config`] if the parsed values fail [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, AggregateError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `group_window` must be greater than 0
    /// - `group_quota` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `default_category` must not be empty
    pub fn validate(&self) -> Result<(), AggregateError> {
        if self.group_window == 0 {
            return Err(AggregateError::Config(
                "group_window must be greater than 0".into(),
            ));
        }
        if self.group_quota == 0 {
            return Err(AggregateError::Config(
                "group_quota must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(AggregateError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.default_category.trim().is_empty() {
            return Err(AggregateError::Config(
                "default_category must not be empty".into(),
            ));
        }
        Ok(())
    }
}
