use super::*;
use crate::init_sled_timer_db;
use crate::test_utils::enable_logger;
use crate::test_utils::record;
use crate::Priority;
use crate::StorageConfig;
use crate::TimerKind;
use crate::TimerStore;

/// # Case 1: records survive closing and reopening the database
///
/// ## Criterias:
/// 1. every saved record is readable after reopen
/// 2. deleted records stay deleted
#[test]
fn test_records_survive_restart() {
    enable_logger();
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::default();

    let kept = record("petA", TimerKind::Wash, Priority::High);
    let dropped = record("petB", TimerKind::Dry, Priority::Low);
    {
        let db = init_sled_timer_db(dir.path(), &config).unwrap();
        let store = SledTimerStore::new(db, &config).unwrap();
        store.save(&kept).unwrap();
        store.save(&dropped).unwrap();
        store.delete(&dropped.key).unwrap();
        store.flush().unwrap();
    }

    let db = init_sled_timer_db(dir.path(), &config).unwrap();
    let store = SledTimerStore::new(db, &config).unwrap();
    assert_eq!(store.load(&kept.key).unwrap(), Some(kept));
    assert_eq!(store.load(&dropped.key).unwrap(), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_writes_without_flush_on_write() {
    enable_logger();
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        flush_on_write: false,
        ..Default::default()
    };
    let db = init_sled_timer_db(dir.path(), &config).unwrap();
    let store = SledTimerStore::new(db, &config).unwrap();

    let r = record("petA", TimerKind::Fold, Priority::Medium);
    store.save(&r).unwrap();
    assert_eq!(store.load(&r.key).unwrap(), Some(r));
}
