//! Persistent timer store.
//!
//! One [`TimerRecord`] per active timer, keyed `"<owner_id>:<kind>"`. The
//! store must be atomic per key and must survive process restarts. Missing
//! and corrupt entries both load as "not found": a corrupt entry is deleted
//! and the owner falls back to idle, it never surfaces as an error.
//!
//! Adaptors:
//! - [`SledTimerStore`]: on-disk, crash-safe (sled)
//! - [`MemTimerStore`]: in-memory, for tests and ephemeral embedders
mod adaptors;
mod record;

pub use adaptors::*;
pub use record::*;


use std::path::Path;

#[cfg(test)]
use mockall::automock;
use tracing::debug;
use tracing::warn;

use crate::constants::TIMER_DB_DIR;
use crate::Result;
use crate::StorageConfig;
use crate::TimerKey;

#[cfg_attr(test, automock)]
pub trait TimerStore: Send + Sync + 'static {
    /// Inserts or replaces the record stored under `record.key`.
    fn save(
        &self,
        record: &TimerRecord,
    ) -> Result<()>;

    /// Loads one record. Corrupt entries are deleted and reported as `None`.
    fn load(
        &self,
        key: &TimerKey,
    ) -> Result<Option<TimerRecord>>;

    /// Removes a record. Deleting a missing key is not an error.
    fn delete(
        &self,
        key: &TimerKey,
    ) -> Result<()>;

    /// Loads every readable record whose key starts with `prefix`.
    /// Corrupt entries met on the way are deleted.
    fn load_all(
        &self,
        prefix: &str,
    ) -> Result<Vec<TimerRecord>>;

    /// Synchronously flushes dirty IO buffers and calls fsync.
    fn flush(&self) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opens the sled database holding timer records under `db_root_dir`.
pub fn init_sled_timer_db(
    db_root_dir: impl AsRef<Path> + std::fmt::Debug,
    config: &StorageConfig,
) -> std::result::Result<sled::Db, std::io::Error> {
    debug!("init_sled_timer_db from path: {:?}", &db_root_dir);

    let timer_db_path = db_root_dir.as_ref().join(TIMER_DB_DIR);

    sled::Config::default()
        .path(&timer_db_path)
        .cache_capacity(config.cache_capacity)
        .flush_every_ms(Some(config.flush_every_ms))
        .use_compression(true)
        .compression_factor(1)
        .open()
        .map_err(|e| {
            warn!(
                "Try to open DB at this location: {:?} and failed: {:?}",
                timer_db_path, e
            );
            std::io::Error::other(e)
        })
}

/// Decodes a stored value, logging and returning `None` when it is corrupt.
pub(crate) fn decode_or_report(
    stored_key: &[u8],
    bytes: &[u8],
) -> Option<TimerRecord> {
    match TimerRecord::decode(stored_key, bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, "discarding unreadable timer record");
            None
        }
    }
}
