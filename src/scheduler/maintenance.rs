use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::Scheduler;
use crate::utils::async_task::spawn_task;
use crate::ClockSkewMonitor;
use crate::Result;
use crate::TimerEvent;

impl Scheduler {
    /// Spawns the periodic cleanup and clock-skew loop.
    ///
    /// A detected clock change emits [`TimerEvent::ClockSkewDetected`] and
    /// triggers a full restoration. The loop ends when `shutdown` fires or
    /// its sender is dropped.
    pub fn spawn_maintenance(
        &self,
        shutdown: watch::Receiver<()>,
    ) -> JoinHandle<()> {
        spawn_task("maintenance", self.clone().run_maintenance(shutdown))
    }

    async fn run_maintenance(
        self,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<()> {
        let config = self.inner().maintenance_config.clone();
        let clock = self.inner().clock.clone();

        let mut cleanup_tick = tokio::time::interval(config.cleanup_interval());
        cleanup_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut skew_tick = tokio::time::interval(config.clock_check_interval());
        skew_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut monitor = ClockSkewMonitor::new(config.clock_skew_tolerance(), clock.now(), Instant::now());

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("maintenance loop: shutdown signal received.");
                    return Ok(());
                }
                _ = skew_tick.tick() => {
                    if let Some(skew) = monitor.observe(clock.now(), Instant::now()) {
                        warn!(drift_ms = skew.drift_ms, "system clock changed, restoring timers");
                        self.inner().events.publish(TimerEvent::ClockSkewDetected { drift_ms: skew.drift_ms });
                        if let Err(e) = self.restore_all().await {
                            warn!(error = %e, "restore after clock change failed");
                        }
                    }
                }
                _ = cleanup_tick.tick() => {
                    match self.cleanup().await {
                        Ok(report) => debug!(completed = report.completed.len(), "periodic cleanup"),
                        Err(e) => warn!(error = %e, "periodic cleanup failed"),
                    }
                }
            }
        }
    }
}
