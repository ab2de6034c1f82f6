//! In-process lifecycle of one countdown.
//!
//! A [`TimerInstance`] mirrors a persisted [`crate::TimerRecord`] (or, when
//! the reminder could not be scheduled, stands in for one) and owns the
//! foreground tick task that publishes the remaining time for display.
//! Ticks carry no correctness burden: expiry is always recomputed from the
//! absolute end time.
mod ticker;
mod timer_instance;

pub use ticker::*;
pub use timer_instance::*;
