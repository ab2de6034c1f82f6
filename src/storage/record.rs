use std::time::Duration;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::RECORD_SCHEMA_VERSION;
use crate::Priority;
use crate::Result;
use crate::StorageError;
use crate::TimerError;
use crate::TimerKey;
use crate::TimerKind;

/// Persisted state of one running countdown.
///
/// `end_time` is the single source of truth for the remaining duration; the
/// record never stores a relative counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRecord {
    pub key: TimerKey,
    pub end_time: SystemTime,
    pub priority: Priority,
    pub created_at: SystemTime,
    /// Display label for notification copy (e.g. a pet's name)
    pub label: Option<String>,
}

/// On-disk envelope. Kind and priority are stored by name/number so that a
/// record written by a newer build with an unknown variant reads as corrupt
/// instead of silently mapping to something else.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTimerRecord {
    schema_version: u8,
    owner_id: String,
    kind: String,
    end_time: SystemTime,
    priority: u8,
    created_at: SystemTime,
    label: Option<String>,
}

impl TimerRecord {
    /// Builds the record of a countdown started at `now`.
    pub fn start(
        key: TimerKey,
        now: SystemTime,
        duration: Duration,
        priority: Priority,
        label: Option<String>,
    ) -> Result<Self> {
        if duration.is_zero() {
            return Err(TimerError::InvalidDuration(duration).into());
        }
        let end_time = now.checked_add(duration).ok_or(TimerError::EndTimeOverflow)?;

        Ok(Self {
            key,
            end_time,
            priority,
            created_at: now,
            label,
        })
    }

    pub fn is_expired(
        &self,
        now: SystemTime,
    ) -> bool {
        now >= self.end_time
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let persisted = PersistedTimerRecord {
            schema_version: RECORD_SCHEMA_VERSION,
            owner_id: self.key.owner_id().to_string(),
            kind: self.key.kind().as_str().to_string(),
            end_time: self.end_time,
            priority: self.priority.as_u8(),
            created_at: self.created_at,
            label: self.label.clone(),
        };
        Ok(bincode::serialize(&persisted).map_err(StorageError::BincodeError)?)
    }

    /// Decodes and validates a stored value.
    ///
    /// Any failure is reported as [`StorageError::PersistenceCorrupt`].
    pub fn decode(
        stored_key: &[u8],
        bytes: &[u8],
    ) -> std::result::Result<Self, StorageError> {
        let key_str = String::from_utf8_lossy(stored_key).into_owned();
        let corrupt = |reason: String| StorageError::corrupt(key_str.clone(), reason);

        let persisted: PersistedTimerRecord =
            bincode::deserialize(bytes).map_err(|e| corrupt(format!("undecodable: {e}")))?;

        if persisted.schema_version != RECORD_SCHEMA_VERSION {
            return Err(corrupt(format!(
                "unsupported schema version {}",
                persisted.schema_version
            )));
        }

        let kind: TimerKind = persisted.kind.parse().map_err(|e: TimerError| corrupt(e.to_string()))?;
        let priority = Priority::from_u8(persisted.priority)
            .ok_or_else(|| corrupt(format!("priority {} out of range", persisted.priority)))?;
        let key = TimerKey::new(persisted.owner_id, kind).map_err(|e| corrupt(e.to_string()))?;

        if key.to_string().as_bytes() != stored_key {
            return Err(corrupt(format!("record belongs to {key}")));
        }

        if persisted.end_time < persisted.created_at {
            return Err(corrupt("end_time precedes created_at".to_string()));
        }

        Ok(Self {
            key,
            end_time: persisted.end_time,
            priority,
            created_at: persisted.created_at,
            label: persisted.label,
        })
    }
}
