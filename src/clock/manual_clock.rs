use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use parking_lot::RwLock;

use super::Clock;

/// Clock whose "now" only moves when told to.
///
/// Cloning shares the underlying time, so a test can hold one handle while
/// the scheduler owns another. Jumps may go backwards.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    pub fn set(
        &self,
        time: SystemTime,
    ) {
        *self.now.write() = time;
    }

    pub fn advance(
        &self,
        by: Duration,
    ) {
        let mut now = self.now.write();
        *now += by;
    }

    pub fn rewind(
        &self,
        by: Duration,
    ) {
        let mut now = self.now.write();
        *now -= by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.read()
    }
}
