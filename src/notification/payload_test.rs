use std::collections::HashMap;

use super::*;
use crate::test_utils::record;
use crate::NotificationConfig;
use crate::Priority;
use crate::TemplateConfig;
use crate::TimerKind;

#[test]
fn test_builtin_copy_uses_owner_id_without_label() {
    let builder = PayloadBuilder::default();
    let r = record("petA", TimerKind::Wash, Priority::High);

    let payload = builder.build(&r);
    assert_eq!(payload.id, "petA:wash");
    assert_eq!(payload.fire_at, r.end_time);
    assert_eq!(payload.category, TIMER_CATEGORY);
    assert_eq!(payload.user_info.owner_id, "petA");
    assert_eq!(payload.user_info.kind, TimerKind::Wash);
    assert!(payload.body.contains("petA"));
    assert!(payload.body.contains("dryer"));
}

#[test]
fn test_record_label_wins_over_default_label() {
    let config = NotificationConfig {
        default_label: "your pet".to_string(),
        ..Default::default()
    };
    let builder = PayloadBuilder::new(&config);

    let mut labelled = record("petA", TimerKind::Dry, Priority::Low);
    labelled.label = Some("Biscuit".to_string());
    assert!(builder.build(&labelled).body.contains("Biscuit"));

    let unlabelled = record("petA", TimerKind::Dry, Priority::Low);
    let body = builder.build(&unlabelled).body;
    assert!(body.contains("your pet"));
    assert!(!body.contains("petA"));
}

#[test]
fn test_configured_template_overrides_builtin() {
    let mut templates = HashMap::new();
    templates.insert(
        "fold".to_string(),
        TemplateConfig {
            title: "{kind} finished".to_string(),
            body: "{label}: done".to_string(),
        },
    );
    let builder = PayloadBuilder::new(&NotificationConfig {
        templates,
        ..Default::default()
    });

    let payload = builder.build(&record("petB", TimerKind::Fold, Priority::Medium));
    assert_eq!(payload.title, "fold finished");
    assert_eq!(payload.body, "petB: done");

    // Other kinds keep the built-in copy
    let wash = builder.build(&record("petB", TimerKind::Wash, Priority::Medium));
    assert_eq!(wash.title, "Wash cycle done");
}
