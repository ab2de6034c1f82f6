//! Notification budget configuration
//!
//! ```toml
//! [budget]
//! capacity = 64
//! warning_threshold_percent = 78
//! critical_threshold_percent = 94
//! tie_break = "oldest_first"
//! ```

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_NOTIFICATION_CAPACITY;
use crate::Error;
use crate::Result;

/// Which of two equal-priority pending entries is evicted first
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionTieBreak {
    /// Evict the entry with the oldest `created_at`
    #[default]
    OldestFirst,
    /// Evict the entry with the newest `created_at`
    NewestFirst,
}

/// Budget configuration for the capped notification channel
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BudgetConfig {
    /// Maximum number of notifications the channel holds pending at once
    ///
    /// Default: 64 (the source platform's global ceiling)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Usage (in percent of capacity) at which status becomes `Warning`
    #[serde(default = "default_warning_threshold_percent")]
    pub warning_threshold_percent: u8,

    /// Usage (in percent of capacity) at which status becomes `Critical`
    #[serde(default = "default_critical_threshold_percent")]
    pub critical_threshold_percent: u8,

    /// Equal-priority eviction order
    #[serde(default)]
    pub tie_break: EvictionTieBreak,
}
impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            warning_threshold_percent: default_warning_threshold_percent(),
            critical_threshold_percent: default_critical_threshold_percent(),
            tie_break: EvictionTieBreak::default(),
        }
    }
}
impl BudgetConfig {
    /// Thresholds must be monotonic and non-overlapping:
    /// `0 < warning < critical < 100`.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "budget.capacity must be > 0".into(),
            )));
        }

        if self.warning_threshold_percent == 0 {
            return Err(Error::Config(ConfigError::Message(
                "budget.warning_threshold_percent must be > 0".into(),
            )));
        }

        if self.warning_threshold_percent >= self.critical_threshold_percent {
            return Err(Error::Config(ConfigError::Message(format!(
                "budget.warning_threshold_percent {} must be less than critical_threshold_percent {}",
                self.warning_threshold_percent, self.critical_threshold_percent
            ))));
        }

        if self.critical_threshold_percent >= 100 {
            return Err(Error::Config(ConfigError::Message(format!(
                "budget.critical_threshold_percent must be below 100 (got {})",
                self.critical_threshold_percent
            ))));
        }

        Ok(())
    }
}

fn default_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}
fn default_warning_threshold_percent() -> u8 {
    78
}
fn default_critical_threshold_percent() -> u8 {
    94
}
