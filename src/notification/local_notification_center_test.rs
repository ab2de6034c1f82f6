use std::sync::Arc;

use super::*;
use crate::test_utils::manual_clock;
use crate::test_utils::mins;
use crate::test_utils::record;
use crate::test_utils::record_at;
use crate::test_utils::t0;
use crate::ManualClock;
use crate::Priority;
use crate::TimerKind;

fn center(capacity: usize) -> (LocalNotificationCenter, Arc<ManualClock>) {
    let clock = manual_clock();
    (LocalNotificationCenter::new(capacity, clock.clone()), clock)
}

fn payload(owner_id: &str) -> NotificationPayload {
    PayloadBuilder::default().build(&record(owner_id, TimerKind::Wash, Priority::Low))
}

#[tokio::test]
async fn test_submissions_above_capacity_are_silently_dropped() {
    let (center, _clock) = center(2);

    center.submit(payload("a")).await.unwrap();
    center.submit(payload("b")).await.unwrap();
    center.submit(payload("c")).await.unwrap();

    assert_eq!(center.list_pending().await.unwrap(), vec!["a:wash", "b:wash"]);
}

#[tokio::test]
async fn test_resubmitting_same_id_replaces_at_capacity() {
    let (center, _clock) = center(1);
    center.submit(payload("a")).await.unwrap();

    let mut replacement = payload("a");
    replacement.title = "changed".to_string();
    center.submit(replacement).await.unwrap();

    assert_eq!(center.list_pending().await.unwrap().len(), 1);
    assert_eq!(center.pending_payload("a:wash").unwrap().title, "changed");
}

#[tokio::test]
async fn test_due_entries_move_to_delivered() {
    let (center, clock) = center(8);
    let builder = PayloadBuilder::default();
    center
        .submit(builder.build(&record_at("a", TimerKind::Wash, t0(), mins(10), Priority::Low)))
        .await
        .unwrap();
    center
        .submit(builder.build(&record_at("b", TimerKind::Dry, t0(), mins(20), Priority::Low)))
        .await
        .unwrap();

    clock.advance(mins(10));
    assert_eq!(center.list_pending().await.unwrap(), vec!["b:dry"]);
    assert_eq!(center.list_delivered().await.unwrap(), vec!["a:wash"]);

    let drained = center.take_delivered_payloads();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].id, "a:wash");
    assert!(center.take_delivered_payloads().is_empty());

    center.clear_delivered(&["a:wash".to_string()]).await.unwrap();
    assert!(center.list_delivered().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_unknown_id_is_ignored() {
    let (center, _clock) = center(4);
    center.submit(payload("a")).await.unwrap();

    center.cancel("zzz:wash").await.unwrap();
    center.cancel("a:wash").await.unwrap();
    assert!(center.list_pending().await.unwrap().is_empty());
}
