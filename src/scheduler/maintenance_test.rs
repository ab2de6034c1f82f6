use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::key;
use crate::test_utils::manual_clock;
use crate::test_utils::mins;
use crate::LocalNotificationCenter;
use crate::MemTimerStore;
use crate::Priority;
use crate::TimerKind;
use crate::TimerStore;
use crate::WashdayConfig;

/// # Case: wall clock jumps forward while the loop runs
///
/// ## Criterias:
/// 1. a `ClockSkewDetected` event with positive drift
/// 2. the timer that elapsed during the jump completes
/// 3. the loop exits on shutdown
#[tokio::test(start_paused = true)]
async fn test_clock_jump_triggers_restore() {
    enable_logger();
    let clock = manual_clock();
    let store = Arc::new(MemTimerStore::new());
    let scheduler = SchedulerBuilder::new(WashdayConfig::default())
        .clock(clock.clone())
        .store(store.clone())
        .channel(Arc::new(LocalNotificationCenter::new(64, clock.clone())))
        .build()
        .unwrap();
    scheduler.enter_background();
    scheduler
        .start("petA", TimerKind::Dry, mins(30), Priority::Medium)
        .await
        .unwrap();

    let mut events = scheduler.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = scheduler.spawn_maintenance(shutdown_rx);

    // Let the loop take its first samples before the jump
    tokio::time::sleep(Duration::from_millis(10)).await;
    clock.advance(mins(60));

    let mut skew = None;
    let mut completed = false;
    while skew.is_none() || !completed {
        match events.recv().await {
            Some(TimerEvent::ClockSkewDetected { drift_ms }) => skew = Some(drift_ms),
            Some(TimerEvent::Completed { key: k }) => {
                assert_eq!(k, key("petA", TimerKind::Dry));
                completed = true;
            }
            Some(_) => {}
            None => panic!("event stream closed"),
        }
    }
    assert!(skew.unwrap() > 0);
    assert!(store.is_empty());

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_maintenance_cleans_up_periodically_without_skew() {
    enable_logger();
    let clock = manual_clock();
    let mut config = WashdayConfig::default();
    config.maintenance.cleanup_interval_ms = 1_000;
    let scheduler = SchedulerBuilder::new(config)
        .clock(clock.clone())
        .store(Arc::new(MemTimerStore::new()))
        .channel(Arc::new(LocalNotificationCenter::new(64, clock.clone())))
        .build()
        .unwrap();
    scheduler.enter_background();
    scheduler
        .start("petA", TimerKind::Wash, Duration::from_secs(1), Priority::Low)
        .await
        .unwrap();

    let mut events = scheduler.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let handle = scheduler.spawn_maintenance(shutdown_rx);

    tokio::time::sleep(Duration::from_millis(10)).await;
    // Within skew tolerance
    clock.advance(Duration::from_secs(1));

    loop {
        match events.recv().await {
            Some(TimerEvent::Completed { .. }) => break,
            Some(TimerEvent::ClockSkewDetected { .. }) => panic!("no skew expected"),
            Some(_) => {}
            None => panic!("event stream closed"),
        }
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}
