use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::ManualClock;
use crate::MemTimerStore;
use crate::Priority;
use crate::TimerKey;
use crate::TimerKind;
use crate::TimerRecord;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// 2024-01-01T00:00:00Z
pub(crate) fn t0() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_704_067_200)
}

pub(crate) fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

pub(crate) fn mins(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

pub(crate) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

pub(crate) fn key(
    owner_id: &str,
    kind: TimerKind,
) -> TimerKey {
    TimerKey::new(owner_id, kind).unwrap()
}

/// Record started at `created_at` running for `duration`.
pub(crate) fn record_at(
    owner_id: &str,
    kind: TimerKind,
    created_at: SystemTime,
    duration: Duration,
    priority: Priority,
) -> TimerRecord {
    TimerRecord::start(key(owner_id, kind), created_at, duration, priority, None).unwrap()
}

pub(crate) fn record(
    owner_id: &str,
    kind: TimerKind,
    priority: Priority,
) -> TimerRecord {
    record_at(owner_id, kind, t0(), mins(30), priority)
}

pub(crate) fn mem_store() -> Arc<MemTimerStore> {
    Arc::new(MemTimerStore::new())
}
