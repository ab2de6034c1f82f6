use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::key;
use crate::test_utils::manual_clock;
use crate::test_utils::mem_store;
use crate::test_utils::mins;
use crate::test_utils::secs;
use crate::test_utils::t0;
use crate::BudgetStatus;
use crate::Error;
use crate::ExpiryNotice;
use crate::LocalNotificationCenter;
use crate::ManualClock;
use crate::MemTimerStore;
use crate::MockClock;
use crate::MockNotificationChannel;
use crate::NotificationChannel;
use crate::NotificationError;
use crate::NotificationPayload;
use crate::Priority;
use crate::TimerError;
use crate::TimerKind;
use crate::Result;
use crate::TimerStore;
use crate::WashdayConfig;

struct Harness {
    scheduler: Scheduler,
    clock: Arc<ManualClock>,
    store: Arc<MemTimerStore>,
    center: Arc<LocalNotificationCenter>,
}

fn config(capacity: usize) -> WashdayConfig {
    let mut config = WashdayConfig::default();
    config.budget.capacity = capacity;
    config
}

fn build(
    capacity: usize,
    clock: Arc<ManualClock>,
    store: Arc<MemTimerStore>,
    center: Arc<LocalNotificationCenter>,
) -> Harness {
    let scheduler = SchedulerBuilder::new(config(capacity))
        .clock(clock.clone())
        .store(store.clone())
        .channel(center.clone())
        .build()
        .unwrap();
    Harness {
        scheduler,
        clock,
        store,
        center,
    }
}

fn harness(capacity: usize) -> Harness {
    enable_logger();
    let clock = manual_clock();
    let center = Arc::new(LocalNotificationCenter::new(capacity, clock.clone()));
    build(capacity, clock, mem_store(), center)
}

fn drain(events: &mut EventStream) -> Vec<TimerEvent> {
    let mut out = Vec::new();
    while let Some(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn completions(events: &[TimerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, TimerEvent::Completed { .. }))
        .count()
}

/// # Case 1: absolute time survives backgrounding
///
/// ## Criterias:
/// 1. start a 30 minute timer at T
/// 2. background at T, foreground at T+12m
/// 3. remaining is exactly 18 minutes and no completion was emitted
#[tokio::test]
async fn test_remaining_is_recomputed_after_background() {
    let h = harness(64);
    let mut events = h.scheduler.subscribe();

    let handle = h
        .scheduler
        .start("petA", TimerKind::Wash, mins(30), Priority::High)
        .await
        .unwrap();
    assert_eq!(handle.end_time, t0() + mins(30));
    assert_eq!(handle.delivery, Delivery::Scheduled);

    h.scheduler.enter_background();
    assert!(!h.scheduler.is_foreground());
    h.clock.advance(mins(12));

    let report = h.scheduler.enter_foreground().await.unwrap();
    assert_eq!(report.running, vec![key("petA", TimerKind::Wash)]);
    assert!(report.completed.is_empty());

    let remaining = h.scheduler.remaining("petA", TimerKind::Wash).unwrap();
    assert_eq!(remaining.remaining, mins(18));
    assert!(remaining.is_active);
    assert_eq!(completions(&drain(&mut events)), 0);
}

/// # Case 2: completion while the process was gone
///
/// ## Criterias:
/// 1. start 45 minutes at T, process exits
/// 2. new process at T+2h restores: exactly one completion, record deleted
/// 3. nothing is resubmitted and a second restore is silent
#[tokio::test]
async fn test_elapsed_while_closed_completes_exactly_once() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(45), Priority::Medium)
        .await
        .unwrap();
    let Harness {
        scheduler,
        clock,
        store,
        center,
    } = h;
    drop(scheduler);

    clock.advance(mins(120));
    let h = build(64, clock, store, center);
    let mut events = h.scheduler.subscribe();

    let report = h.scheduler.restore_all().await.unwrap();
    assert_eq!(report.completed, vec![key("petA", TimerKind::Wash)]);
    assert!(report.running.is_empty());
    assert!(report.resubmitted.is_empty());
    assert!(h.store.is_empty());
    assert!(h.center.list_pending().await.unwrap().is_empty());
    assert!(h.center.list_delivered().await.unwrap().is_empty());

    let report = h.scheduler.restore_all().await.unwrap();
    assert_eq!(report, RestoreReport::default());

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![TimerEvent::Completed {
            key: key("petA", TimerKind::Wash)
        }]
    );
}

/// # Case 3: a high priority start evicts the oldest low priority reminder
#[tokio::test]
async fn test_budget_eviction_at_capacity() {
    let h = harness(64);
    for i in 0..64 {
        h.scheduler
            .start(&format!("pet{i}"), TimerKind::Dry, mins(60), Priority::Low)
            .await
            .unwrap();
        h.clock.advance(secs(1));
    }
    assert_eq!(h.scheduler.budget_status().await.unwrap().status, BudgetStatus::Full);

    let mut events = h.scheduler.subscribe();
    let handle = h
        .scheduler
        .start("petX", TimerKind::Wash, mins(30), Priority::High)
        .await
        .unwrap();

    let victim = key("pet0", TimerKind::Dry);
    assert_eq!(
        handle.delivery,
        Delivery::ScheduledByEviction {
            evicted: victim.clone()
        }
    );
    assert_eq!(h.center.list_pending().await.unwrap().len(), 64);
    assert!(!h.store.contains(&victim));
    assert_eq!(h.store.len(), 64);

    // The victim keeps counting down in process
    let remaining = h.scheduler.remaining("pet0", TimerKind::Dry).unwrap();
    assert!(remaining.is_active);

    let events = drain(&mut events);
    assert!(events.contains(&TimerEvent::Evicted { key: victim }));
}

/// # Case 4: owners are independent
#[tokio::test]
async fn test_cancel_does_not_touch_other_owners() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(20), Priority::Medium)
        .await
        .unwrap();
    h.scheduler
        .start("petB", TimerKind::Dry, mins(50), Priority::Medium)
        .await
        .unwrap();
    h.clock.advance(mins(5));

    h.scheduler.cancel("petA", TimerKind::Wash).await.unwrap();

    assert!(!h.store.contains(&key("petA", TimerKind::Wash)));
    assert!(h.store.contains(&key("petB", TimerKind::Dry)));
    assert_eq!(h.center.list_pending().await.unwrap(), vec!["petB:dry"]);
    assert_eq!(
        h.scheduler.remaining("petB", TimerKind::Dry).unwrap().remaining,
        mins(45)
    );
    assert_eq!(
        h.scheduler.remaining("petA", TimerKind::Wash).unwrap(),
        Remaining {
            remaining: Duration::ZERO,
            is_active: false
        }
    );
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let h = harness(64);

    let zero = h.scheduler.start("petA", TimerKind::Wash, Duration::ZERO, Priority::Low).await;
    assert!(matches!(zero, Err(Error::Timer(TimerError::InvalidDuration(_)))));

    let too_long = h
        .scheduler
        .start("petA", TimerKind::Wash, Duration::from_secs(365 * 24 * 3600), Priority::Low)
        .await;
    assert!(matches!(too_long, Err(Error::Timer(TimerError::DurationTooLong { .. }))));

    let blank = h.scheduler.start(" ", TimerKind::Wash, mins(1), Priority::Low).await;
    assert!(matches!(blank, Err(Error::Timer(TimerError::InvalidOwnerId(_)))));

    assert!(h.store.is_empty());
    assert!(h.center.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restart_replaces_record_and_notification() {
    let h = harness(64);
    let first = h
        .scheduler
        .start("petA", TimerKind::Fold, mins(10), Priority::Low)
        .await
        .unwrap();
    h.clock.advance(mins(1));
    let second = h
        .scheduler
        .start_with(TimerRequest::new("petA", TimerKind::Fold, mins(40), Priority::High).with_label("Biscuit"))
        .await
        .unwrap();

    assert!(second.generation > first.generation);
    assert_eq!(h.store.len(), 1);
    let record = h.store.load(&key("petA", TimerKind::Fold)).unwrap().unwrap();
    assert_eq!(record.end_time, t0() + mins(41));
    assert_eq!(record.priority, Priority::High);

    let pending = h.center.pending_payload("petA:fold").unwrap();
    assert_eq!(pending.fire_at, t0() + mins(41));
    assert!(pending.body.contains("Biscuit"));
    assert_eq!(h.center.list_pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_expiry_notice_never_completes_successor() {
    let h = harness(64);
    let mut events = h.scheduler.subscribe();
    let first = h
        .scheduler
        .start("petA", TimerKind::Wash, mins(10), Priority::Low)
        .await
        .unwrap();
    h.scheduler
        .start("petA", TimerKind::Wash, mins(60), Priority::Low)
        .await
        .unwrap();
    h.clock.advance(mins(20));

    h.scheduler
        .inner()
        .complete_if_current(ExpiryNotice {
            key: key("petA", TimerKind::Wash),
            generation: first.generation,
        })
        .await
        .unwrap();

    assert!(h.scheduler.remaining("petA", TimerKind::Wash).unwrap().is_active);
    assert!(h.store.contains(&key("petA", TimerKind::Wash)));
    assert_eq!(completions(&drain(&mut events)), 0);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let h = harness(64);
    let mut events = h.scheduler.subscribe();

    h.scheduler.cancel("nobody", TimerKind::Dry).await.unwrap();
    h.scheduler
        .start("petA", TimerKind::Dry, mins(10), Priority::Low)
        .await
        .unwrap();
    h.scheduler.cancel("petA", TimerKind::Dry).await.unwrap();
    h.scheduler.cancel("petA", TimerKind::Dry).await.unwrap();

    let cancelled: Vec<TimerEvent> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, TimerEvent::Cancelled { .. }))
        .collect();
    assert_eq!(
        cancelled,
        vec![TimerEvent::Cancelled {
            key: key("petA", TimerKind::Dry)
        }]
    );
    assert!(h.store.is_empty());
    assert_eq!(h.scheduler.budget_status().await.unwrap().pending_count, 0);
}

#[tokio::test]
async fn test_cancel_owner_matches_owner_exactly() {
    let h = harness(64);
    for (owner, kind) in [
        ("petA", TimerKind::Wash),
        ("petA", TimerKind::Dry),
        ("petA:x", TimerKind::Fold),
    ] {
        h.scheduler.start(owner, kind, mins(10), Priority::Low).await.unwrap();
    }

    let mut cancelled = h.scheduler.cancel_owner("petA").await.unwrap();
    cancelled.sort();
    assert_eq!(
        cancelled,
        vec![key("petA", TimerKind::Wash), key("petA", TimerKind::Dry)]
    );
    assert_eq!(h.store.len(), 1);
    assert!(h.store.contains(&key("petA:x", TimerKind::Fold)));
}

#[tokio::test]
async fn test_restore_is_idempotent() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(30), Priority::Low)
        .await
        .unwrap();
    let mut events = h.scheduler.subscribe();
    h.clock.advance(mins(10));

    let first = h.scheduler.restore("petA", TimerKind::Wash).await.unwrap();
    let second = h.scheduler.restore("petA", TimerKind::Wash).await.unwrap();
    assert_eq!(first, RestoreResult::Running { remaining: mins(20) });
    assert_eq!(second, first);

    h.scheduler.restore_all().await.unwrap();
    assert!(drain(&mut events).is_empty());
    assert_eq!(h.center.list_pending().await.unwrap().len(), 1);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_restore_without_timer_is_idle() {
    let h = harness(64);
    assert_eq!(
        h.scheduler.restore("petA", TimerKind::Recurrence).await.unwrap(),
        RestoreResult::Idle
    );
}

#[tokio::test]
async fn test_corrupt_record_restores_as_idle() {
    let h = harness(64);
    h.store.insert_raw("petA:wash", b"not a record".to_vec());
    let mut events = h.scheduler.subscribe();

    assert_eq!(
        h.scheduler.restore("petA", TimerKind::Wash).await.unwrap(),
        RestoreResult::Idle
    );
    assert!(h.store.is_empty());
    assert!(!h.scheduler.remaining("petA", TimerKind::Wash).unwrap().is_active);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_rejected_delivery_keeps_timer_in_process() {
    let h = harness(1);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(30), Priority::High)
        .await
        .unwrap();

    let handle = h
        .scheduler
        .start("petB", TimerKind::Wash, mins(10), Priority::Low)
        .await
        .unwrap();
    assert_eq!(
        handle.delivery,
        Delivery::NotScheduled(DeliveryWarning::BudgetExhausted)
    );
    assert!(!h.store.contains(&key("petB", TimerKind::Wash)));
    assert!(h.scheduler.remaining("petB", TimerKind::Wash).unwrap().is_active);

    // Still completed by the process
    let mut events = h.scheduler.subscribe();
    h.scheduler.enter_background();
    h.clock.advance(mins(11));
    let report = h.scheduler.cleanup().await.unwrap();
    assert_eq!(report.completed, vec![key("petB", TimerKind::Wash)]);
    assert_eq!(completions(&drain(&mut events)), 1);
}

#[tokio::test]
async fn test_submission_failure_is_reported_not_raised() {
    enable_logger();
    let mut channel = MockNotificationChannel::new();
    channel.expect_list_pending().returning(|| Ok(vec![]));
    channel.expect_submit().returning(|payload| {
        Err(NotificationError::SubmissionFailed {
            id: payload.id,
            reason: "permission denied".to_string(),
        }
        .into())
    });
    channel.expect_cancel().returning(|_| Ok(()));
    channel.expect_clear_delivered().returning(|_| Ok(()));

    let store = Arc::new(MemTimerStore::new());
    let scheduler = SchedulerBuilder::new(config(64))
        .clock(manual_clock())
        .store(store.clone())
        .channel(Arc::new(channel))
        .build()
        .unwrap();

    let handle = scheduler
        .start("petA", TimerKind::Dry, mins(10), Priority::Critical)
        .await
        .unwrap();
    assert!(matches!(
        handle.delivery,
        Delivery::NotScheduled(DeliveryWarning::SubmissionFailed(_))
    ));
    assert!(store.is_empty());
    assert!(scheduler.remaining("petA", TimerKind::Dry).unwrap().is_active);
    assert_eq!(scheduler.budget_status().await.unwrap().pending_count, 0);
}

#[tokio::test]
async fn test_restore_all_resubmits_lost_reminders() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(30), Priority::Low)
        .await
        .unwrap();

    // The OS dropped the reminder behind our back
    h.center.cancel("petA:wash").await.unwrap();

    let report = h.scheduler.restore_all().await.unwrap();
    assert_eq!(report.resubmitted, vec![key("petA", TimerKind::Wash)]);
    assert_eq!(h.center.list_pending().await.unwrap(), vec!["petA:wash"]);
}

#[tokio::test]
async fn test_cleanup_completes_background_timers_and_clears_delivered() {
    let h = harness(64);
    h.scheduler.enter_background();
    h.scheduler
        .start("petA", TimerKind::Wash, mins(10), Priority::Low)
        .await
        .unwrap();
    h.scheduler
        .start("petB", TimerKind::Wash, mins(60), Priority::Low)
        .await
        .unwrap();
    let mut events = h.scheduler.subscribe();

    h.clock.advance(mins(11));
    assert!(h.scheduler.check_expired("petA", TimerKind::Wash).unwrap());
    assert!(!h.scheduler.check_expired("petB", TimerKind::Wash).unwrap());
    assert!(!h.scheduler.check_expired("nobody", TimerKind::Wash).unwrap());

    let report = h.scheduler.cleanup().await.unwrap();
    assert_eq!(report.completed, vec![key("petA", TimerKind::Wash)]);
    assert!(h.center.list_delivered().await.unwrap().is_empty());
    assert_eq!(h.center.take_delivered_payloads().len(), 1);

    let again = h.scheduler.cleanup().await.unwrap();
    assert!(again.completed.is_empty());
    assert_eq!(completions(&drain(&mut events)), 1);
    assert!(h.store.contains(&key("petB", TimerKind::Wash)));
}

#[tokio::test(start_paused = true)]
async fn test_foreground_tick_completes_timer() {
    let h = harness(64);
    let mut watch = h.scheduler.watch("petA", TimerKind::Wash).unwrap();
    let mut other = h.scheduler.watch("petB", TimerKind::Wash).unwrap();

    h.scheduler
        .start("petA", TimerKind::Wash, secs(3), Priority::Low)
        .await
        .unwrap();
    let mut ticks = h.scheduler.ticks("petA", TimerKind::Wash).unwrap();

    h.clock.advance(secs(3));
    assert!(matches!(watch.recv().await, Some(TimerEvent::Started { .. })));
    assert_eq!(
        watch.recv().await,
        Some(TimerEvent::Completed {
            key: key("petA", TimerKind::Wash)
        })
    );
    assert_eq!(*ticks.borrow_and_update(), Duration::ZERO);
    assert!(h.store.is_empty());
    assert!(other.try_recv().is_none());

    // Nothing left to complete
    assert!(h.scheduler.cleanup().await.unwrap().completed.is_empty());
}

#[tokio::test]
async fn test_ticks_start_at_remaining_time() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Dry, mins(30), Priority::Low)
        .await
        .unwrap();

    let ticks = h.scheduler.ticks("petA", TimerKind::Dry).unwrap();
    assert_eq!(*ticks.borrow(), mins(30));

    let idle = h.scheduler.ticks("petB", TimerKind::Dry).unwrap();
    assert_eq!(*idle.borrow(), Duration::ZERO);
}

#[tokio::test]
async fn test_remaining_reads_store_after_restart_with_mock_clock() {
    enable_logger();
    let store = Arc::new(MemTimerStore::new());
    store
        .save(&crate::test_utils::record("petA", TimerKind::Wash, Priority::Low))
        .unwrap();

    let mut clock = MockClock::new();
    clock.expect_now().return_const(t0() + mins(25));

    let center = Arc::new(LocalNotificationCenter::new(64, manual_clock()));
    let scheduler = SchedulerBuilder::new(config(64))
        .clock(Arc::new(clock))
        .store(store)
        .channel(center)
        .build()
        .unwrap();

    // Not restored yet: answered from the store
    let remaining = scheduler.remaining("petA", TimerKind::Wash).unwrap();
    assert_eq!(remaining.remaining, mins(5));
    assert!(remaining.is_active);
}

/// Local center whose first `cancel` of one id parks until released.
struct GatedChannel {
    inner: Arc<LocalNotificationCenter>,
    gated_id: String,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedChannel {
    fn new(
        inner: Arc<LocalNotificationCenter>,
        gated_id: &str,
    ) -> Self {
        Self {
            inner,
            gated_id: gated_id.to_string(),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for GatedChannel {
    async fn submit(
        &self,
        payload: NotificationPayload,
    ) -> Result<()> {
        self.inner.submit(payload).await
    }

    async fn cancel(
        &self,
        id: &str,
    ) -> Result<()> {
        if id == self.gated_id && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.cancel(id).await
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        self.inner.list_pending().await
    }

    async fn list_delivered(&self) -> Result<Vec<String>> {
        self.inner.list_delivered().await
    }

    async fn clear_delivered(
        &self,
        ids: &[String],
    ) -> Result<()> {
        self.inner.clear_delivered(ids).await
    }
}

/// # Case 3: start is observed whole before a later cancel of the same key
///
/// ## Criterias:
/// 1. capacity 1, petV:dry (low) pending, a cancel of petV parked inside the
///    channel while holding petV's lock
/// 2. start petA (high) evicts petV and waits on petV's lock to demote it
/// 3. cancel petA meanwhile: petA's stream reads Started then Cancelled
#[tokio::test]
async fn test_start_is_published_before_demoting_the_victim() {
    enable_logger();
    let clock = manual_clock();
    let center = Arc::new(LocalNotificationCenter::new(1, clock.clone()));
    let channel = Arc::new(GatedChannel::new(center.clone(), "petV:dry"));
    let scheduler = SchedulerBuilder::new(config(1))
        .clock(clock.clone())
        .store(mem_store())
        .channel(channel.clone())
        .build()
        .unwrap();

    scheduler
        .start("petV", TimerKind::Dry, mins(30), Priority::Low)
        .await
        .unwrap();
    let mut watch = scheduler.watch("petA", TimerKind::Wash).unwrap();

    channel.armed.store(true, Ordering::SeqCst);
    let victim_cancel = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.cancel("petV", TimerKind::Dry).await })
    };
    channel.entered.notified().await;

    let start = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            scheduler
                .start("petA", TimerKind::Wash, mins(10), Priority::High)
                .await
        })
    };

    let started = tokio::time::timeout(secs(5), watch.recv())
        .await
        .expect("start must be published while the victim is still locked");
    assert_eq!(
        started,
        Some(TimerEvent::Started {
            key: key("petA", TimerKind::Wash),
            end_time: t0() + mins(10),
            delivery: Delivery::ScheduledByEviction {
                evicted: key("petV", TimerKind::Dry)
            },
        })
    );

    scheduler.cancel("petA", TimerKind::Wash).await.unwrap();
    assert_eq!(
        watch.try_recv(),
        Some(TimerEvent::Cancelled {
            key: key("petA", TimerKind::Wash)
        })
    );

    channel.release.notify_one();
    victim_cancel.await.unwrap().unwrap();
    start.await.unwrap().unwrap();

    assert!(watch.try_recv().is_none());
    assert!(!scheduler.remaining("petA", TimerKind::Wash).unwrap().is_active);
    assert!(center.list_pending().await.unwrap().is_empty());
}

/// # Case 4: two owners complete independently from foreground ticks
///
/// ## Criterias:
/// 1. petA starts 1 minute at T, petB starts 1 minute at T+5s
/// 2. petA completes first while petB still has 5 seconds left
/// 3. petB completes 5 seconds later; each stream only carries its own key
#[tokio::test(start_paused = true)]
async fn test_two_owners_complete_independently_in_foreground() {
    let h = harness(64);
    let mut watch_a = h.scheduler.watch("petA", TimerKind::Wash).unwrap();
    let mut watch_b = h.scheduler.watch("petB", TimerKind::Wash).unwrap();
    let key_a = key("petA", TimerKind::Wash);
    let key_b = key("petB", TimerKind::Wash);

    h.scheduler
        .start("petA", TimerKind::Wash, mins(1), Priority::Medium)
        .await
        .unwrap();
    h.clock.advance(secs(5));
    h.scheduler
        .start("petB", TimerKind::Wash, mins(1), Priority::Medium)
        .await
        .unwrap();

    h.clock.advance(secs(55));
    assert!(matches!(watch_a.recv().await, Some(TimerEvent::Started { .. })));
    assert_eq!(watch_a.recv().await, Some(TimerEvent::Completed { key: key_a.clone() }));

    let remaining_b = h.scheduler.remaining("petB", TimerKind::Wash).unwrap();
    assert!(remaining_b.is_active);
    assert_eq!(remaining_b.remaining, secs(5));
    assert!(matches!(watch_b.try_recv(), Some(TimerEvent::Started { .. })));
    assert!(watch_b.try_recv().is_none());

    h.clock.advance(secs(5));
    assert_eq!(watch_b.recv().await, Some(TimerEvent::Completed { key: key_b.clone() }));

    assert!(watch_a.try_recv().is_none());
    assert!(watch_b.try_recv().is_none());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_check_expired_only_drops_corrupt_records() {
    let h = harness(64);
    h.scheduler.enter_background();
    h.scheduler
        .start("petA", TimerKind::Wash, mins(10), Priority::Low)
        .await
        .unwrap();
    h.store.insert_raw("petB:wash", b"not a record".to_vec());
    let mut events = h.scheduler.subscribe();

    h.clock.advance(mins(11));
    assert!(h.scheduler.check_expired("petA", TimerKind::Wash).unwrap());
    assert!(!h.scheduler.check_expired("petB", TimerKind::Wash).unwrap());

    // The elapsed timer is untouched, the corrupt entry is gone
    assert!(h.store.contains(&key("petA", TimerKind::Wash)));
    assert!(!h.store.contains(&key("petB", TimerKind::Wash)));
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_finished_keys_release_locks_and_tick_channels() {
    let h = harness(64);
    h.scheduler
        .start("petA", TimerKind::Wash, mins(10), Priority::Low)
        .await
        .unwrap();
    h.scheduler
        .start("petB", TimerKind::Dry, mins(10), Priority::Low)
        .await
        .unwrap();
    assert_eq!(h.scheduler.inner().key_lock_count(), 0);
    assert_eq!(h.scheduler.inner().tick_channel_count(), 2);

    h.scheduler.cancel("petA", TimerKind::Wash).await.unwrap();
    assert_eq!(h.scheduler.inner().tick_channel_count(), 1);

    h.clock.advance(mins(11));
    h.scheduler.cleanup().await.unwrap();
    assert_eq!(h.scheduler.inner().tick_channel_count(), 0);

    // A subscription on an idle key lives as long as its receiver
    let idle = h.scheduler.ticks("petC", TimerKind::Fold).unwrap();
    h.scheduler.cleanup().await.unwrap();
    assert_eq!(h.scheduler.inner().tick_channel_count(), 1);
    drop(idle);
    h.scheduler.cleanup().await.unwrap();
    assert_eq!(h.scheduler.inner().tick_channel_count(), 0);
    assert_eq!(h.scheduler.inner().key_lock_count(), 0);
}
