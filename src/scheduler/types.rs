use std::time::Duration;
use std::time::SystemTime;

use crate::Priority;
use crate::TimerKey;
use crate::TimerKind;

/// A timer start request from the embedding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRequest {
    pub owner_id: String,
    pub kind: TimerKind,
    pub duration: Duration,
    pub priority: Priority,
    /// Display label for the reminder copy
    pub label: Option<String>,
}

impl TimerRequest {
    pub fn new(
        owner_id: impl Into<String>,
        kind: TimerKind,
        duration: Duration,
        priority: Priority,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind,
            duration,
            priority,
            label: None,
        }
    }

    pub fn with_label(
        mut self,
        label: impl Into<String>,
    ) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Why a running countdown has no background reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryWarning {
    /// Channel full and nothing of lower priority to evict
    BudgetExhausted,
    /// The channel refused the submission
    SubmissionFailed(String),
}

/// Background reminder outcome of a start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Scheduled,
    ScheduledByEviction { evicted: TimerKey },
    /// The countdown runs in process only; completion is still reported
    /// while the scheduler is alive.
    NotScheduled(DeliveryWarning),
}

impl Delivery {
    pub fn is_scheduled(&self) -> bool {
        !matches!(self, Delivery::NotScheduled(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    pub key: TimerKey,
    pub end_time: SystemTime,
    pub generation: u64,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub remaining: Duration,
    pub is_active: bool,
}

impl Remaining {
    pub(crate) const IDLE: Remaining = Remaining {
        remaining: Duration::ZERO,
        is_active: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreResult {
    Idle,
    Running { remaining: Duration },
    Completed,
}

/// Outcome of [`crate::Scheduler::restore_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub running: Vec<TimerKey>,
    pub completed: Vec<TimerKey>,
    /// Running timers whose reminder had vanished from the channel and was
    /// submitted again
    pub resubmitted: Vec<TimerKey>,
    /// Running timers whose vanished reminder could not be re-admitted
    pub demoted: Vec<TimerKey>,
}

/// Outcome of [`crate::Scheduler::cleanup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub completed: Vec<TimerKey>,
    pub cleared_delivered: usize,
    pub pruned: usize,
}
