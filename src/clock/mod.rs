//! Wall-clock abstraction.
//!
//! Every countdown is an absolute [`SystemTime`] deadline, so the only thing
//! the scheduler ever asks of a clock is "what time is it now". Calendar time
//! is used on purpose: it keeps advancing across process restarts and device
//! sleep, which a monotonic tick does not.
//!
//! System clock changes are detected by [`ClockSkewMonitor`], which compares
//! wall-clock progress against the monotonic clock.

mod manual_clock;
mod skew_monitor;

pub use manual_clock::*;
pub use skew_monitor::*;


use std::time::Duration;
use std::time::SystemTime;

#[cfg(test)]
use mockall::automock;

/// Source of wall-clock "now"
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// Production clock backed by the operating system's calendar time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Time left until `end_time`, saturating at zero once it has passed.
#[inline]
pub fn remaining_until(
    end_time: SystemTime,
    now: SystemTime,
) -> Duration {
    end_time.duration_since(now).unwrap_or(Duration::ZERO)
}
