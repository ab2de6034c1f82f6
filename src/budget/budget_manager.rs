use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::AdmitResult;
use crate::BudgetConfig;
use crate::BudgetState;
use crate::EvictedEntry;
use crate::EvictionTieBreak;
use crate::NotificationChannel;
use crate::Priority;
use crate::Result;
use crate::TimerKey;
use crate::TimerRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Admitted, submission in flight
    Reserved,
    /// Submitted to the channel
    Submitted,
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    priority: Priority,
    created_at: SystemTime,
    state: SlotState,
}

/// Keeps the channel's pending count at or below capacity.
///
/// The manager tracks the reminders it submitted (its ledger) next to the
/// channel's live pending set. Ids pending on the channel that the ledger
/// does not know count against capacity but are never evicted.
///
/// Admission holds a single async mutex, so concurrent admits for different
/// keys cannot both take the last slot. Submitting happens outside the lock
/// against a reservation which the caller then [`confirm`](Self::confirm)s
/// or [`release`](Self::release)s.
pub struct BudgetManager {
    config: BudgetConfig,
    channel: Arc<dyn NotificationChannel>,
    ledger: Mutex<HashMap<TimerKey, LedgerEntry>>,
}

impl std::fmt::Debug for BudgetManager {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("BudgetManager")
            .field("capacity", &self.config.capacity)
            .field("tie_break", &self.config.tie_break)
            .finish()
    }
}

impl BudgetManager {
    pub fn new(
        config: BudgetConfig,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            config,
            channel,
            ledger: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Reserves a slot for `record`, evicting a strictly lower priority
    /// pending reminder when the channel is full.
    pub async fn admit(
        &self,
        record: &TimerRecord,
    ) -> Result<AdmitResult> {
        let mut ledger = self.ledger.lock().await;
        let pending: HashSet<String> = self.channel.list_pending().await?.into_iter().collect();

        let occupied = occupied_slots(&pending, &ledger, Some(&record.key));
        if occupied < self.config.capacity {
            reserve(&mut ledger, record);
            debug!(key = %record.key, occupied, "admitted");
            return Ok(AdmitResult::Accepted);
        }

        let Some((victim_key, victim)) = self.select_victim(&pending, &ledger, record) else {
            info!(
                key = %record.key,
                priority = ?record.priority,
                capacity = self.config.capacity,
                "notification budget exhausted, admission rejected"
            );
            return Ok(AdmitResult::Rejected);
        };

        self.channel.cancel(&victim_key.to_string()).await?;
        ledger.remove(&victim_key);
        reserve(&mut ledger, record);

        info!(
            key = %record.key,
            evicted = %victim_key,
            evicted_priority = ?victim.priority,
            "admitted by evicting a lower priority reminder"
        );
        Ok(AdmitResult::AcceptedByEviction(EvictedEntry {
            key: victim_key,
            priority: victim.priority,
            created_at: victim.created_at,
        }))
    }

    /// Marks a reservation as submitted.
    pub async fn confirm(
        &self,
        key: &TimerKey,
    ) {
        let mut ledger = self.ledger.lock().await;
        match ledger.get_mut(key) {
            Some(entry) => entry.state = SlotState::Submitted,
            None => warn!(%key, "confirm for an untracked key"),
        }
    }

    /// Frees the slot held by `key`. No-op when the key is untracked.
    pub async fn release(
        &self,
        key: &TimerKey,
    ) {
        if self.ledger.lock().await.remove(key).is_some() {
            debug!(%key, "released budget slot");
        }
    }

    /// Rebuilds the ledger from persisted `records` and the channel's live
    /// `pending` ids. In-flight reservations are kept.
    ///
    /// Returns the keys of records whose reminder is no longer pending.
    pub async fn reconcile(
        &self,
        pending: &[String],
        records: &[TimerRecord],
    ) -> Vec<TimerKey> {
        let pending: HashSet<&str> = pending.iter().map(String::as_str).collect();
        let mut ledger = self.ledger.lock().await;
        let before = ledger.len();

        ledger.retain(|_, entry| entry.state == SlotState::Reserved);

        let mut missing = Vec::new();
        for record in records {
            if ledger.contains_key(&record.key) {
                continue;
            }
            if pending.contains(record.key.to_string().as_str()) {
                ledger.insert(
                    record.key.clone(),
                    LedgerEntry {
                        priority: record.priority,
                        created_at: record.created_at,
                        state: SlotState::Submitted,
                    },
                );
            } else {
                missing.push(record.key.clone());
            }
        }

        if before != ledger.len() || !missing.is_empty() {
            info!(
                before,
                after = ledger.len(),
                missing = missing.len(),
                "budget ledger reconciled"
            );
        }
        missing
    }

    /// Drops submitted entries that are no longer pending on the channel.
    pub async fn prune(
        &self,
        pending: &[String],
    ) -> usize {
        let pending: HashSet<&str> = pending.iter().map(String::as_str).collect();
        let mut ledger = self.ledger.lock().await;
        let before = ledger.len();
        ledger.retain(|key, entry| {
            entry.state == SlotState::Reserved || pending.contains(key.to_string().as_str())
        });
        before - ledger.len()
    }

    pub async fn status(&self) -> Result<BudgetState> {
        let ledger = self.ledger.lock().await;
        let pending: HashSet<String> = self.channel.list_pending().await?.into_iter().collect();
        let occupied = occupied_slots(&pending, &ledger, None);
        Ok(BudgetState::compute(occupied, &self.config))
    }

    pub async fn is_tracked(
        &self,
        key: &TimerKey,
    ) -> bool {
        self.ledger.lock().await.contains_key(key)
    }

    fn select_victim(
        &self,
        pending: &HashSet<String>,
        ledger: &HashMap<TimerKey, LedgerEntry>,
        incoming: &TimerRecord,
    ) -> Option<(TimerKey, LedgerEntry)> {
        ledger
            .iter()
            .filter(|(key, entry)| {
                **key != incoming.key
                    && entry.state == SlotState::Submitted
                    && entry.priority < incoming.priority
                    && pending.contains(&key.to_string())
            })
            .min_by(|(a_key, a), (b_key, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| match self.config.tie_break {
                        EvictionTieBreak::OldestFirst => a.created_at.cmp(&b.created_at),
                        EvictionTieBreak::NewestFirst => b.created_at.cmp(&a.created_at),
                    })
                    .then_with(|| a_key.cmp(b_key))
            })
            .map(|(key, entry)| (key.clone(), *entry))
    }
}

/// `|pending ∪ reservations|`, not counting `exclude` (a key being
/// re-admitted replaces its own pending entry instead of taking a new slot).
fn occupied_slots(
    pending: &HashSet<String>,
    ledger: &HashMap<TimerKey, LedgerEntry>,
    exclude: Option<&TimerKey>,
) -> usize {
    let exclude_id = exclude.map(|k| k.to_string());
    let from_channel = pending
        .iter()
        .filter(|id| exclude_id.as_ref() != Some(*id))
        .count();
    let in_flight = ledger
        .iter()
        .filter(|(key, entry)| {
            entry.state == SlotState::Reserved
                && Some(*key) != exclude
                && !pending.contains(&key.to_string())
        })
        .count();
    from_channel + in_flight
}

fn reserve(
    ledger: &mut HashMap<TimerKey, LedgerEntry>,
    record: &TimerRecord,
) {
    ledger.insert(
        record.key.clone(),
        LedgerEntry {
            priority: record.priority,
            created_at: record.created_at,
            state: SlotState::Reserved,
        },
    );
}

