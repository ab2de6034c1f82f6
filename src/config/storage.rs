use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Persistent timer store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Force an fsync after every save/delete.
    ///
    /// When false, sled's background flusher (`flush_every_ms`) bounds the
    /// window of writes that a power loss can drop.
    #[serde(default = "default_flush_on_write")]
    pub flush_on_write: bool,

    /// Background flush period of the sled database (milliseconds)
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: u64,

    /// Page cache size of the sled database (bytes)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            flush_on_write: default_flush_on_write(),
            flush_every_ms: default_flush_every_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}
impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.flush_every_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "storage.flush_every_ms must be > 0".into(),
            )));
        }

        if self.cache_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "storage.cache_capacity must be > 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_flush_on_write() -> bool {
    true
}
fn default_flush_every_ms() -> u64 {
    500
}
fn default_cache_capacity() -> u64 {
    //1MB, a timer record is well under 100 bytes
    1024 * 1024
}
