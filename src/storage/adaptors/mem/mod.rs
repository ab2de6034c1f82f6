mod mem_timer_store;

pub use mem_timer_store::*;
