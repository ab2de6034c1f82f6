//! # washday
//!
//! A persistent multi-owner timer and notification-budget scheduler.
//!
//! Owners (pets, machines, people) run independent countdowns per
//! [`TimerKind`]. Each countdown is an absolute wall-clock end time stored in
//! a [`TimerStore`], so it survives suspension, termination and restart with
//! zero drift. Reminders go through a [`NotificationChannel`] with a hard
//! global capacity; the [`BudgetManager`] keeps the pending count under that
//! ceiling and evicts lower priority reminders when a more important one
//! arrives.
//!
//! ```ignore
//! let scheduler = SchedulerBuilder::new(config).channel(channel).build()?;
//! scheduler.restore_all().await?;
//!
//! let handle = scheduler
//!     .start("petA", TimerKind::Wash, Duration::from_secs(45 * 60), Priority::High)
//!     .await?;
//! let mut events = scheduler.watch("petA", TimerKind::Wash)?;
//! ```

mod budget;
mod clock;
mod config;
mod constants;
mod errors;
mod notification;
mod scheduler;
mod storage;
mod timer;
mod types;
pub(crate) mod utils;

pub use budget::*;
pub use clock::*;
pub use self::config::*;
pub use constants::KEY_SEPARATOR;
pub use errors::*;
pub use notification::*;
pub use scheduler::*;
pub use storage::*;
pub use timer::*;
pub use types::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
