use std::time::Duration;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::remaining_until;
use crate::Priority;
use crate::TimerKey;
use crate::TimerRecord;

/// Running countdown held by the scheduler.
#[derive(Debug)]
pub struct TimerInstance {
    record: TimerRecord,
    generation: u64,
    /// A background reminder is pending on the notification channel
    scheduled: bool,
    tick_token: Option<CancellationToken>,
}

impl TimerInstance {
    pub fn new(
        record: TimerRecord,
        generation: u64,
        scheduled: bool,
    ) -> Self {
        Self {
            record,
            generation,
            scheduled,
            tick_token: None,
        }
    }

    pub fn key(&self) -> &TimerKey {
        &self.record.key
    }

    pub fn record(&self) -> &TimerRecord {
        &self.record
    }

    pub fn end_time(&self) -> SystemTime {
        self.record.end_time
    }

    pub fn created_at(&self) -> SystemTime {
        self.record.created_at
    }

    pub fn priority(&self) -> Priority {
        self.record.priority
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remaining(
        &self,
        now: SystemTime,
    ) -> Duration {
        remaining_until(self.record.end_time, now)
    }

    pub fn is_expired(
        &self,
        now: SystemTime,
    ) -> bool {
        self.record.is_expired(now)
    }

    /// Whether a background reminder backs this countdown.
    /// `false` means foreground-only.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn set_scheduled(
        &mut self,
        scheduled: bool,
    ) {
        self.scheduled = scheduled;
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Installs the token of a freshly spawned tick task, stopping any
    /// previous one.
    pub fn attach_ticks(
        &mut self,
        token: CancellationToken,
    ) {
        self.stop_ticks();
        self.tick_token = Some(token);
    }

    pub fn stop_ticks(&mut self) {
        if let Some(token) = self.tick_token.take() {
            token.cancel();
        }
    }
}

impl Drop for TimerInstance {
    fn drop(&mut self) {
        self.stop_ticks();
    }
}
