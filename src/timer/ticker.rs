use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::remaining_until;
use crate::Clock;
use crate::TimerKey;

/// Sent by a tick task when it observes its end time.
///
/// The generation lets the receiver discard notices from an instance that
/// has since been replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryNotice {
    pub key: TimerKey,
    pub generation: u64,
}

/// Everything a tick task needs. Cheap to build per start.
pub(crate) struct Ticker {
    pub(crate) key: TimerKey,
    pub(crate) generation: u64,
    pub(crate) end_time: SystemTime,
    pub(crate) interval: Duration,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) remaining_tx: watch::Sender<Duration>,
    pub(crate) expiry_tx: mpsc::UnboundedSender<ExpiryNotice>,
}

impl Ticker {
    /// Spawns the tick loop. It stops on `token` cancellation or right after
    /// reporting expiry.
    pub(crate) fn spawn(
        self,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(token).await })
    }

    async fn run(
        self,
        token: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(key = %self.key, generation = self.generation, "tick task cancelled");
                    return;
                }
                _ = interval.tick() => {
                    let remaining = remaining_until(self.end_time, self.clock.now());
                    self.remaining_tx.send_replace(remaining);

                    if remaining.is_zero() {
                        trace!(key = %self.key, generation = self.generation, "tick observed expiry");
                        let _ = self.expiry_tx.send(ExpiryNotice {
                            key: self.key.clone(),
                            generation: self.generation,
                        });
                        return;
                    }
                }
            }
        }
    }
}
