use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use crate::Clock;
use crate::NotificationChannel;
use crate::NotificationPayload;
use crate::Result;

/// In-process notification centre.
///
/// Behaves like a mobile OS scheduler: at most `capacity` notifications are
/// pending at once and anything submitted beyond that is dropped without an
/// error. A pending entry turns into a delivered one as soon as a query
/// observes that its `fire_at` has passed.
pub struct LocalNotificationCenter {
    capacity: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<CenterState>,
}

#[derive(Default)]
struct CenterState {
    pending: BTreeMap<String, NotificationPayload>,
    delivered: BTreeMap<String, NotificationPayload>,
    /// Delivered payloads not yet handed to the presenter
    undrained: Vec<NotificationPayload>,
}

impl std::fmt::Debug for LocalNotificationCenter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LocalNotificationCenter")
            .field("capacity", &self.capacity)
            .field("pending", &state.pending.len())
            .field("delivered", &state.delivered.len())
            .finish()
    }
}

impl LocalNotificationCenter {
    pub fn new(
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            capacity,
            clock,
            state: Mutex::new(CenterState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drains payloads delivered since the previous call, oldest first.
    pub fn take_delivered_payloads(&self) -> Vec<NotificationPayload> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);
        std::mem::take(&mut state.undrained)
    }

    /// Pending payload by id.
    pub fn pending_payload(
        &self,
        id: &str,
    ) -> Option<NotificationPayload> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);
        state.pending.get(id).cloned()
    }

    fn promote_due(
        &self,
        state: &mut CenterState,
    ) {
        let now = self.clock.now();
        let mut due: Vec<NotificationPayload> = Vec::new();
        state.pending.retain(|_, payload| {
            if payload.fire_at <= now {
                due.push(payload.clone());
                false
            } else {
                true
            }
        });

        due.sort_by_key(|p| p.fire_at);
        for payload in due {
            trace!(id = %payload.id, "notification delivered");
            state.delivered.insert(payload.id.clone(), payload.clone());
            state.undrained.push(payload);
        }
    }
}

#[async_trait]
impl NotificationChannel for LocalNotificationCenter {
    async fn submit(
        &self,
        payload: NotificationPayload,
    ) -> Result<()> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);

        if !state.pending.contains_key(&payload.id) && state.pending.len() >= self.capacity {
            debug!(id = %payload.id, capacity = self.capacity, "notification centre full, submission dropped");
            return Ok(());
        }

        state.delivered.remove(&payload.id);
        state.pending.insert(payload.id.clone(), payload);
        Ok(())
    }

    async fn cancel(
        &self,
        id: &str,
    ) -> Result<()> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);
        state.pending.remove(id);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);
        Ok(state.pending.keys().cloned().collect())
    }

    async fn list_delivered(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        self.promote_due(&mut state);
        Ok(state.delivered.keys().cloned().collect())
    }

    async fn clear_delivered(
        &self,
        ids: &[String],
    ) -> Result<()> {
        let mut state = self.state.lock();
        for id in ids {
            state.delivered.remove(id);
        }
        Ok(())
    }
}
