use std::time::SystemTime;

use crate::BudgetConfig;
use crate::Priority;
use crate::TimerKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Healthy,
    Warning,
    Critical,
    Full,
}

/// Snapshot of notification channel usage. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetState {
    pub pending_count: usize,
    pub capacity: usize,
    pub status: BudgetStatus,
}

impl BudgetState {
    pub(crate) fn compute(
        pending_count: usize,
        config: &BudgetConfig,
    ) -> Self {
        let capacity = config.capacity;
        let status = if pending_count >= capacity {
            BudgetStatus::Full
        } else {
            let percent = pending_count * 100 / capacity;
            if percent >= config.critical_threshold_percent as usize {
                BudgetStatus::Critical
            } else if percent >= config.warning_threshold_percent as usize {
                BudgetStatus::Warning
            } else {
                BudgetStatus::Healthy
            }
        };

        Self {
            pending_count,
            capacity,
            status,
        }
    }

    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.pending_count)
    }
}

/// A pending reminder cancelled to make room for a higher-priority one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedEntry {
    pub key: TimerKey,
    pub priority: Priority,
    /// Start time of the evicted timer; lets the owner of the key tell the
    /// evicted run apart from a later restart.
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitResult {
    Accepted,
    AcceptedByEviction(EvictedEntry),
    /// Capacity exhausted and nothing of lower priority to evict
    Rejected,
}

impl AdmitResult {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AdmitResult::Rejected)
    }
}
