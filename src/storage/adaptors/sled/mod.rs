mod sled_timer_store;

pub use sled_timer_store::*;

#[cfg(test)]
mod sled_timer_store_test;
