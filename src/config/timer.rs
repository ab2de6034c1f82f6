use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Countdown configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimerConfig {
    /// Foreground tick period (milliseconds). Display only, at most 1 second.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Longest countdown accepted by `start` (seconds)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}
impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}
impl TimerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.tick_interval_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "timer.tick_interval_ms must be between 1 and 1000, got {}",
                self.tick_interval_ms
            ))));
        }

        if self.max_duration_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "timer.max_duration_secs must be > 0".into(),
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_max_duration_secs() -> u64 {
    // 30 days
    30 * 24 * 3600
}
