use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::constants::TIMER_RECORDS_TREE;
use crate::decode_or_report;
use crate::Result;
use crate::StorageConfig;
use crate::StorageError;
use crate::TimerKey;
use crate::TimerRecord;
use crate::TimerStore;

/// Crash-safe timer store backed by one sled tree.
///
/// sled applies single-key inserts atomically, so a crash leaves either the
/// old or the new record under a key, never a torn one.
pub struct SledTimerStore {
    db: sled::Db,
    tree: sled::Tree,
    flush_on_write: bool,
}

impl std::fmt::Debug for SledTimerStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledTimerStore")
            .field("tree_len", &self.tree.len())
            .field("flush_on_write", &self.flush_on_write)
            .finish()
    }
}

impl SledTimerStore {
    pub fn new(
        db: sled::Db,
        config: &StorageConfig,
    ) -> Result<Self> {
        let tree = db.open_tree(TIMER_RECORDS_TREE).map_err(StorageError::SledError)?;
        debug!(records = tree.len(), "opened timer record tree");

        Ok(Self {
            db,
            tree,
            flush_on_write: config.flush_on_write,
        })
    }

    fn flush_if_required(&self) -> Result<()> {
        if self.flush_on_write {
            self.tree.flush().map_err(StorageError::SledError)?;
        }
        Ok(())
    }

    /// Writes raw bytes under `key`, bypassing the codec.
    #[cfg(test)]
    pub(crate) fn insert_raw(
        &self,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.tree.insert(key.as_bytes(), bytes).map_err(StorageError::SledError)?;
        Ok(())
    }
}

impl TimerStore for SledTimerStore {
    #[instrument(skip(self, record), fields(key = %record.key))]
    fn save(
        &self,
        record: &TimerRecord,
    ) -> Result<()> {
        let bytes = record.encode()?;
        self.tree
            .insert(record.key.to_string().as_bytes(), bytes)
            .map_err(StorageError::SledError)?;
        self.flush_if_required()
    }

    #[instrument(skip(self))]
    fn load(
        &self,
        key: &TimerKey,
    ) -> Result<Option<TimerRecord>> {
        let stored_key = key.to_string();
        let Some(bytes) = self.tree.get(stored_key.as_bytes()).map_err(StorageError::SledError)? else {
            return Ok(None);
        };

        match decode_or_report(stored_key.as_bytes(), &bytes) {
            Some(record) => Ok(Some(record)),
            None => {
                self.tree.remove(stored_key.as_bytes()).map_err(StorageError::SledError)?;
                self.flush_if_required()?;
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    fn delete(
        &self,
        key: &TimerKey,
    ) -> Result<()> {
        let removed = self
            .tree
            .remove(key.to_string().as_bytes())
            .map_err(StorageError::SledError)?;
        if removed.is_some() {
            self.flush_if_required()?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_all(
        &self,
        prefix: &str,
    ) -> Result<Vec<TimerRecord>> {
        let mut records = Vec::new();
        let mut corrupt = Vec::new();

        for item in self.tree.scan_prefix(prefix.as_bytes()) {
            let (k, v) = item.map_err(StorageError::SledError)?;
            match decode_or_report(&k, &v) {
                Some(record) => records.push(record),
                None => corrupt.push(k),
            }
        }

        if !corrupt.is_empty() {
            for k in &corrupt {
                self.tree.remove(k).map_err(StorageError::SledError)?;
            }
            self.flush_if_required()?;
        }

        trace!(loaded = records.len(), discarded = corrupt.len(), "load_all");
        Ok(records)
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.db.flush().map_err(StorageError::SledError)?;
        trace!("flushed {} bytes", bytes);
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}
