//! Timer Scheduler Error Hierarchy
//!
//! Defines the error types of the timer scheduler, categorized by the
//! component that raises them. Corruption and capacity exhaustion are not
//! errors here: corrupt records load as "not found" and a full notification
//! budget is a normal [`crate::AdmitResult::Rejected`] outcome.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected timer requests (fatal to the call only)
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Persistent store failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Notification channel failures
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// Zero-length countdowns are rejected at the call site
    #[error("Timer duration must be greater than zero (got {0:?})")]
    InvalidDuration(Duration),

    /// Durations above the configured ceiling
    #[error("Timer duration {requested:?} exceeds the maximum of {max:?}")]
    DurationTooLong { requested: Duration, max: Duration },

    /// `now + duration` does not fit in the wall clock
    #[error("Timer end time overflows the wall clock")]
    EndTimeOverflow,

    /// Owner ids must be non-blank
    #[error("Invalid owner id: {0:?}")]
    InvalidOwnerId(String),

    /// Kind names outside the known set
    #[error("Unknown timer kind: {0}")]
    UnknownKind(String),

    /// Keys not shaped like `<owner_id>:<kind>`
    #[error("Invalid timer key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures while opening the store
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Custom error with the path that failed
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Embedded database errors
    #[error(transparent)]
    SledError(#[from] sled::Error),

    /// Serialization failures for persisted records
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Record unreadable or malformed. Callers treat it as "no timer exists".
    #[error("Persisted record at {key} is corrupt: {reason}")]
    PersistenceCorrupt { key: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The channel refused a submission
    #[error("Failed to submit notification {id}: {reason}")]
    SubmissionFailed { id: String, reason: String },

    /// The channel cannot be reached at all
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn corrupt(
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StorageError::PersistenceCorrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
