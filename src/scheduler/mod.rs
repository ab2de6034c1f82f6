//! Composition root: owns the running timers and wires the store, the
//! budget and the notification channel together.
mod builder;
mod event;
mod maintenance;
#[allow(clippy::module_inception)]
mod scheduler;
mod types;

pub use builder::*;
pub use event::*;
pub use scheduler::*;
pub use types::*;

#[cfg(test)]
mod scheduler_test;
#[cfg(test)]
mod maintenance_test;
