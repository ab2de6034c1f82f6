use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::decode_or_report;
use crate::Result;
use crate::TimerKey;
use crate::TimerRecord;
use crate::TimerStore;

/// In-memory timer store.
///
/// Keeps encoded bytes rather than records so that it goes through the same
/// codec as the on-disk store.
#[derive(Debug, Default)]
pub struct MemTimerStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes raw bytes under `key`, bypassing the codec.
    pub fn insert_raw(
        &self,
        key: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.data.write().insert(key.into(), bytes);
    }

    pub fn contains(
        &self,
        key: &TimerKey,
    ) -> bool {
        self.data.read().contains_key(&key.to_string())
    }
}

impl TimerStore for MemTimerStore {
    fn save(
        &self,
        record: &TimerRecord,
    ) -> Result<()> {
        let bytes = record.encode()?;
        self.data.write().insert(record.key.to_string(), bytes);
        Ok(())
    }

    fn load(
        &self,
        key: &TimerKey,
    ) -> Result<Option<TimerRecord>> {
        let stored_key = key.to_string();
        let mut data = self.data.write();
        let Some(bytes) = data.get(&stored_key) else {
            return Ok(None);
        };

        match decode_or_report(stored_key.as_bytes(), bytes) {
            Some(record) => Ok(Some(record)),
            None => {
                data.remove(&stored_key);
                Ok(None)
            }
        }
    }

    fn delete(
        &self,
        key: &TimerKey,
    ) -> Result<()> {
        self.data.write().remove(&key.to_string());
        Ok(())
    }

    fn load_all(
        &self,
        prefix: &str,
    ) -> Result<Vec<TimerRecord>> {
        let mut data = self.data.write();
        let mut records = Vec::new();
        let mut corrupt = Vec::new();

        for (k, v) in data.range(prefix.to_string()..) {
            if !k.starts_with(prefix) {
                break;
            }
            match decode_or_report(k.as_bytes(), v) {
                Some(record) => records.push(record),
                None => corrupt.push(k.clone()),
            }
        }

        for k in &corrupt {
            data.remove(k);
        }

        trace!(loaded = records.len(), discarded = corrupt.len(), "load_all");
        Ok(records)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.read().len()
    }
}
