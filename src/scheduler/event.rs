use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use crate::Delivery;
use crate::TimerKey;

/// Everything the scheduler reports to its embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Started {
        key: TimerKey,
        end_time: SystemTime,
        delivery: Delivery,
    },
    /// Delivered exactly once per logical completion
    Completed { key: TimerKey },
    Cancelled { key: TimerKey },
    /// The background reminder was cancelled to make room for a higher
    /// priority one. The countdown keeps running in process.
    Evicted { key: TimerKey },
    /// The wall clock moved relative to the monotonic clock
    ClockSkewDetected { drift_ms: i64 },
}

impl TimerEvent {
    pub fn key(&self) -> Option<&TimerKey> {
        match self {
            TimerEvent::Started { key, .. }
            | TimerEvent::Completed { key }
            | TimerEvent::Cancelled { key }
            | TimerEvent::Evicted { key } => Some(key),
            TimerEvent::ClockSkewDetected { .. } => None,
        }
    }
}

/// Unbounded stream of [`TimerEvent`]s.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<TimerEvent>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<TimerEvent> {
        self.rx.recv().await
    }

    /// Next already-published event, without waiting.
    pub fn try_recv(&mut self) -> Option<TimerEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for EventStream {
    type Item = TimerEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Fan-out of timer events to global subscribers and per-key watchers.
///
/// Closed receivers are pruned lazily on the next publish.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<TimerEvent>>>,
    watchers: DashMap<TimerKey, Vec<mpsc::UnboundedSender<TimerEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        EventStream { rx }
    }

    pub(crate) fn watch(
        &self,
        key: TimerKey,
    ) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.entry(key).or_default().push(tx);
        EventStream { rx }
    }

    pub(crate) fn publish(
        &self,
        event: TimerEvent,
    ) {
        trace!(?event, "publish");

        if let Some(key) = event.key() {
            self.watchers.remove_if_mut(key, |_, watchers| {
                watchers.retain(|tx| tx.send(event.clone()).is_ok());
                watchers.is_empty()
            });
        }

        self.subscribers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }
}
