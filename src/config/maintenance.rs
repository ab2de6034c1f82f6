use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Background maintenance loop configuration
///
/// ```toml
/// [maintenance]
/// cleanup_interval_ms = 60000
/// clock_check_interval_ms = 5000
/// clock_skew_tolerance_ms = 2000
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// How often expired records and delivered notifications are cleaned up
    ///
    /// Range: 100-86400000 (100ms to 1 day)
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// How often wall-clock progress is compared against the monotonic clock
    #[serde(default = "default_clock_check_interval_ms")]
    pub clock_check_interval_ms: u64,

    /// Divergence between wall and monotonic progress that counts as a
    /// system clock change
    #[serde(default = "default_clock_skew_tolerance_ms")]
    pub clock_skew_tolerance_ms: u64,
}
impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_ms: default_cleanup_interval_ms(),
            clock_check_interval_ms: default_clock_check_interval_ms(),
            clock_skew_tolerance_ms: default_clock_skew_tolerance_ms(),
        }
    }
}
impl MaintenanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(100..=86_400_000).contains(&self.cleanup_interval_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "maintenance.cleanup_interval_ms must be between 100 and 86400000, got {}",
                self.cleanup_interval_ms
            ))));
        }

        if self.clock_check_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "maintenance.clock_check_interval_ms must be > 0".into(),
            )));
        }

        if self.clock_skew_tolerance_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "maintenance.clock_skew_tolerance_ms must be > 0".into(),
            )));
        }

        Ok(())
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn clock_check_interval(&self) -> Duration {
        Duration::from_millis(self.clock_check_interval_ms)
    }

    pub fn clock_skew_tolerance(&self) -> Duration {
        Duration::from_millis(self.clock_skew_tolerance_ms)
    }
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}
fn default_clock_check_interval_ms() -> u64 {
    5_000
}
fn default_clock_skew_tolerance_ms() -> u64 {
    2_000
}
