use std::time::Duration;
use std::time::SystemTime;

use tokio::time::Instant;
use tracing::debug;

/// A detected system clock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSkew {
    /// Wall-clock progress minus monotonic progress since the previous
    /// sample, in milliseconds. Positive when the wall clock jumped forward.
    pub drift_ms: i64,
}

/// Detects system clock changes by sampling both clocks.
///
/// Between two samples the wall clock and the monotonic clock should advance
/// by the same amount. A divergence above `tolerance` means the wall clock
/// was set (or the device slept, which also warrants a restoration pass).
#[derive(Debug)]
pub struct ClockSkewMonitor {
    tolerance: Duration,
    last_wall: SystemTime,
    last_mono: Instant,
}

impl ClockSkewMonitor {
    pub fn new(
        tolerance: Duration,
        wall: SystemTime,
        mono: Instant,
    ) -> Self {
        Self {
            tolerance,
            last_wall: wall,
            last_mono: mono,
        }
    }

    /// Records a new sample and reports a skew if the clocks diverged.
    pub fn observe(
        &mut self,
        wall: SystemTime,
        mono: Instant,
    ) -> Option<ClockSkew> {
        let mono_elapsed = millis_i64(mono.saturating_duration_since(self.last_mono));
        let wall_elapsed = match wall.duration_since(self.last_wall) {
            Ok(forward) => millis_i64(forward),
            Err(backward) => -millis_i64(backward.duration()),
        };

        self.last_wall = wall;
        self.last_mono = mono;

        let drift_ms = wall_elapsed.saturating_sub(mono_elapsed);
        if drift_ms.unsigned_abs() > self.tolerance.as_millis() as u64 {
            debug!(drift_ms, wall_elapsed, mono_elapsed, "wall clock diverged from monotonic clock");
            Some(ClockSkew { drift_ms })
        } else {
            None
        }
    }
}

fn millis_i64(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
