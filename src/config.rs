//! Pool and machine configuration.
//!
//! Both settings types deserialize from JSON with every field optional;
//! missing fields keep their defaults. Programmatic configuration goes
//! through [`MachineBuilder`](crate::builder::MachineBuilder).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings applied by a [`KeyedPool`](crate::pool::KeyedPool).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Pre-sizing overrides, by pool key. Replaces a descriptor's default
    /// capacity when its key is registered.
    pub capacities: HashMap<String, usize>,

    /// Maximum number of free instances kept per key. Releases past this
    /// limit dispose the instance instead of pooling it. `None` keeps all.
    pub max_retained: Option<usize>,
}

impl PoolSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the pre-sized capacity of one key.
    pub fn with_capacity(mut self, key: impl Into<String>, capacity: usize) -> Self {
        self.capacities.insert(key.into(), capacity);
        self
    }

    /// Cap the number of free instances retained per key.
    pub fn with_max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = Some(max_retained);
        self
    }

    /// Capacity to pre-size `key` with, falling back to the descriptor's.
    pub fn capacity_for(&self, key: &str, fallback: usize) -> usize {
        self.capacities.get(key).copied().unwrap_or(fallback)
    }
}

/// Settings applied by a [`StateMachine`](crate::machine::StateMachine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Number of transition records kept in the machine's journal.
    /// Zero disables the journal.
    pub history_capacity: usize,

    /// Whether `fixed_update` also evaluates `check_switch_states`.
    pub fixed_update_checks: bool,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            history_capacity: 32,
            fixed_update_checks: true,
        }
    }
}

impl MachineSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
