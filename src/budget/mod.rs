//! Admission control for the capped notification channel.
mod budget_manager;
mod budget_state;

pub use budget_manager::*;
pub use budget_state::*;
