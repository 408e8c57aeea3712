//! # Revision Protocol Configuration
//!
//! Timeouts and message size limits for revision sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::LoggingConfig;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON could not be parsed into a config.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Revision session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    /// Total time a session may keep starting rounds.
    pub session_duration_secs: u64,

    /// Time allowed for each round, from settings to commit.
    pub round_deadline_secs: u64,

    /// Time to wait for another session to release an obligation.
    pub lock_timeout_ms: u64,

    /// Cap on an encoded revision.
    pub max_revision_size: u64,

    /// Cap on an encoded renter signature.
    pub max_signature_size: u64,

    /// Cap on an accept / stop / reject response.
    pub max_response_size: u64,

    /// Cap on the contract id sent at session start.
    pub max_contract_id_size: u64,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            session_duration_secs: 1200,
            round_deadline_secs: 600,
            lock_timeout_ms: 1000,
            max_revision_size: 16_000,
            max_signature_size: 16_000,
            max_response_size: 1_000,
            max_contract_id_size: 64,
        }
    }
}

impl RevisionConfig {
    /// Create a config for testing (short timeouts).
    pub fn for_testing() -> Self {
        Self {
            session_duration_secs: 60,
            round_deadline_secs: 10,
            lock_timeout_ms: 200,
            ..Self::default()
        }
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Session duration.
    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    /// Per-round deadline.
    pub fn round_deadline(&self) -> Duration {
        Duration::from_secs(self.round_deadline_secs)
    }

    /// Lock wait.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Top-level host configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Revision protocol settings.
    pub revision: RevisionConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Parse from JSON. Missing sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
