//! Assembles a [`Scheduler`] from its collaborators.
//!
//! Every collaborator has a production default:
//! - clock: [`SystemClock`]
//! - store: [`SledTimerStore`] under `service.db_root_dir`
//! - channel: [`LocalNotificationCenter`] sized to `budget.capacity`
//!
//! ## Example
//! ```ignore
//! let scheduler = SchedulerBuilder::new(WashdayConfig::new()?.validate()?)
//!     .channel(os_channel)
//!     .build()?;
//! scheduler.restore_all().await?;
//! ```

use std::sync::Arc;

use tracing::debug;

use super::Scheduler;
use crate::init_sled_timer_db;
use crate::Clock;
use crate::LocalNotificationCenter;
use crate::NotificationChannel;
use crate::Result;
use crate::SledTimerStore;
use crate::StorageError;
use crate::SystemClock;
use crate::TimerStore;
use crate::WashdayConfig;

pub struct SchedulerBuilder {
    config: WashdayConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn TimerStore>>,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl SchedulerBuilder {
    pub fn new(config: WashdayConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
            channel: None,
        }
    }

    pub fn clock(
        mut self,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn TimerStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn channel(
        mut self,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Validates the scheduler sections of the configuration, opens any
    /// defaulted collaborator and spawns the completion worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Scheduler> {
        let Self {
            config,
            clock,
            store,
            channel,
        } = self;

        config.budget.validate()?;
        config.timer.validate()?;
        config.maintenance.validate()?;
        config.notification.validate()?;

        let clock = clock.unwrap_or_else(|| Arc::new(SystemClock));

        let store = match store {
            Some(store) => store,
            None => {
                debug!(path = ?config.service.db_root_dir, "opening default sled timer store");
                let db = init_sled_timer_db(&config.service.db_root_dir, &config.storage)
                    .map_err(StorageError::IoError)?;
                Arc::new(SledTimerStore::new(db, &config.storage)?)
            }
        };

        let channel = channel.unwrap_or_else(|| {
            Arc::new(LocalNotificationCenter::new(config.budget.capacity, clock.clone()))
        });

        Ok(Scheduler::new(config, clock, store, channel))
    }
}
