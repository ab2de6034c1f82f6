use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::EventBus;
use super::EventStream;
use crate::remaining_until;
use crate::utils::async_task::spawn_task;
use crate::AdmitResult;
use crate::BudgetManager;
use crate::BudgetState;
use crate::CleanupReport;
use crate::Clock;
use crate::Delivery;
use crate::DeliveryWarning;
use crate::EvictedEntry;
use crate::ExpiryNotice;
use crate::MaintenanceConfig;
use crate::NotificationChannel;
use crate::PayloadBuilder;
use crate::Priority;
use crate::Remaining;
use crate::RestoreReport;
use crate::RestoreResult;
use crate::Result;
use crate::Ticker;
use crate::TimerConfig;
use crate::TimerError;
use crate::TimerEvent;
use crate::TimerHandle;
use crate::TimerInstance;
use crate::TimerKey;
use crate::TimerKind;
use crate::TimerRecord;
use crate::TimerRequest;
use crate::TimerStore;
use crate::WashdayConfig;

/// Persistent multi-owner timer scheduler.
///
/// Cheap to clone; clones share one set of timers. Built with
/// [`crate::SchedulerBuilder`].
///
/// Every countdown is an absolute end time persisted in the [`TimerStore`],
/// so it survives suspension and restarts. While the scheduler is in the
/// foreground each running timer has a tick task publishing the remaining
/// time; in the background nothing ticks and completion is detected by
/// [`restore_all`](Self::restore_all) and [`cleanup`](Self::cleanup).
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("instances", &self.inner.instances.len())
            .field("foreground", &self.inner.is_foreground())
            .finish()
    }
}

pub(crate) struct SchedulerInner {
    timer_config: TimerConfig,
    pub(super) maintenance_config: MaintenanceConfig,
    pub(super) clock: Arc<dyn Clock>,
    store: Arc<dyn TimerStore>,
    channel: Arc<dyn NotificationChannel>,
    budget: BudgetManager,
    payloads: PayloadBuilder,
    pub(super) events: EventBus,

    instances: DashMap<TimerKey, TimerInstance>,
    /// Serializes operations on one key. Different keys never contend.
    key_locks: Arc<KeyLocks>,
    /// Latest remaining time per key, shared by successive instances
    tick_channels: DashMap<TimerKey, watch::Sender<Duration>>,

    next_generation: AtomicU64,
    foreground: AtomicBool,
    expiry_tx: mpsc::UnboundedSender<ExpiryNotice>,
}

impl Scheduler {
    pub(super) fn new(
        config: WashdayConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn TimerStore>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(SchedulerInner {
            timer_config: config.timer,
            maintenance_config: config.maintenance,
            clock,
            store,
            budget: BudgetManager::new(config.budget, channel.clone()),
            channel,
            payloads: PayloadBuilder::new(&config.notification),
            events: EventBus::default(),
            instances: DashMap::new(),
            key_locks: Arc::new(DashMap::new()),
            tick_channels: DashMap::new(),
            next_generation: AtomicU64::new(1),
            foreground: AtomicBool::new(true),
            expiry_tx,
        });

        let weak = Arc::downgrade(&inner);
        spawn_task("completion_worker", run_completion_worker(weak, expiry_rx));

        Self { inner }
    }

    pub(super) fn inner(&self) -> &Arc<SchedulerInner> {
        &self.inner
    }

    /// Starts (or restarts) the `kind` countdown of `owner_id`.
    pub async fn start(
        &self,
        owner_id: &str,
        kind: TimerKind,
        duration: Duration,
        priority: Priority,
    ) -> Result<TimerHandle> {
        self.start_with(TimerRequest::new(owner_id, kind, duration, priority)).await
    }

    /// Starts a countdown, replacing any running one for the same key.
    ///
    /// Fails only on invalid input or a storage error. A reminder that
    /// could not be scheduled is reported through [`TimerHandle::delivery`]
    /// while the countdown keeps running in process.
    pub async fn start_with(
        &self,
        request: TimerRequest,
    ) -> Result<TimerHandle> {
        self.inner.start(request).await
    }

    /// Stops a countdown. Idempotent.
    pub async fn cancel(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<()> {
        let key = TimerKey::new(owner_id, kind)?;
        self.inner.cancel(&key).await.map(|_| ())
    }

    /// Stops every countdown of one owner. Returns the keys that were running.
    pub async fn cancel_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<TimerKey>> {
        self.inner.cancel_owner(owner_id).await
    }

    /// Remaining time of a countdown, recomputed from its absolute end time.
    ///
    /// Pure query: an elapsed timer reports zero but is only completed by
    /// restoration or cleanup.
    pub fn remaining(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<Remaining> {
        let key = TimerKey::new(owner_id, kind)?;
        self.inner.remaining(&key)
    }

    /// Whether a timer exists for the key and its end time has passed.
    ///
    /// Never starts, completes or reschedules anything. The one write it may
    /// cause is the store dropping a corrupt record, which then reads as
    /// "no timer".
    pub fn check_expired(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<bool> {
        let key = TimerKey::new(owner_id, kind)?;
        let now = self.inner.clock.now();
        Ok(self.inner.current_record(&key)?.is_some_and(|r| r.is_expired(now)))
    }

    /// Brings one countdown back after suspension or restart.
    pub async fn restore(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<RestoreResult> {
        let key = TimerKey::new(owner_id, kind)?;
        let _guard = self.inner.lock_key(&key).await;
        self.inner.restore_locked(&key).await
    }

    /// Restores every persisted and in-process countdown, then reconciles
    /// the notification budget with the channel.
    pub async fn restore_all(&self) -> Result<RestoreReport> {
        self.inner.restore_all().await
    }

    /// Completes elapsed countdowns and clears delivered reminders.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        self.inner.cleanup().await
    }

    pub async fn budget_status(&self) -> Result<BudgetState> {
        self.inner.budget.status().await
    }

    /// Stops all foreground ticks. Persisted state is untouched.
    pub fn enter_background(&self) {
        self.inner.foreground.store(false, Ordering::Release);
        for mut instance in self.inner.instances.iter_mut() {
            instance.stop_ticks();
        }
        debug!("entered background");
    }

    pub async fn enter_foreground(&self) -> Result<RestoreReport> {
        self.inner.foreground.store(true, Ordering::Release);
        debug!("entering foreground");
        self.inner.restore_all().await
    }

    pub fn is_foreground(&self) -> bool {
        self.inner.is_foreground()
    }

    /// Stream of every event.
    pub fn subscribe(&self) -> EventStream {
        self.inner.events.subscribe()
    }

    /// Stream of the events of one key.
    pub fn watch(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<EventStream> {
        let key = TimerKey::new(owner_id, kind)?;
        Ok(self.inner.events.watch(key))
    }

    /// Latest remaining time of one key, updated by the foreground ticks.
    pub fn ticks(
        &self,
        owner_id: &str,
        kind: TimerKind,
    ) -> Result<watch::Receiver<Duration>> {
        let key = TimerKey::new(owner_id, kind)?;
        let initial = self.inner.remaining(&key)?.remaining;
        Ok(self.inner.tick_sender(&key, initial).subscribe())
    }
}

type KeyLocks = DashMap<TimerKey, Arc<Mutex<()>>>;

/// Exclusive access to one key. On drop the lock entry leaves the map unless
/// another task still holds or awaits it.
struct KeyGuard {
    locks: Arc<KeyLocks>,
    key: TimerKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SchedulerInner {
    fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::Acquire)
    }

    async fn lock_key(
        &self,
        key: &TimerKey,
    ) -> KeyGuard {
        let lock = self.key_locks.entry(key.clone()).or_default().clone();
        KeyGuard {
            locks: self.key_locks.clone(),
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    pub(super) fn key_lock_count(&self) -> usize {
        self.key_locks.len()
    }

    #[cfg(test)]
    pub(super) fn tick_channel_count(&self) -> usize {
        self.tick_channels.len()
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn tick_sender(
        &self,
        key: &TimerKey,
        initial: Duration,
    ) -> watch::Sender<Duration> {
        self.tick_channels
            .entry(key.clone())
            .or_insert_with(|| watch::channel(initial).0)
            .clone()
    }

    fn publish_remaining(
        &self,
        key: &TimerKey,
        remaining: Duration,
    ) {
        if let Some(tx) = self.tick_channels.get(key) {
            tx.send_replace(remaining);
        }
    }

    /// Publishes zero and forgets the key's tick channel when nobody listens.
    fn finish_ticks(
        &self,
        key: &TimerKey,
    ) {
        self.publish_remaining(key, Duration::ZERO);
        self.tick_channels.remove_if(key, |_, tx| tx.receiver_count() == 0);
    }

    fn spawn_ticks(
        &self,
        instance: &mut TimerInstance,
    ) {
        let token = CancellationToken::new();
        let now = self.clock.now();
        let ticker = Ticker {
            key: instance.key().clone(),
            generation: instance.generation(),
            end_time: instance.end_time(),
            interval: self.timer_config.tick_interval(),
            clock: self.clock.clone(),
            remaining_tx: self.tick_sender(instance.key(), instance.remaining(now)),
            expiry_tx: self.expiry_tx.clone(),
        };
        ticker.spawn(token.clone());
        instance.attach_ticks(token);
    }

    /// Record if persisted, otherwise the in-process instance's.
    fn current_record(
        &self,
        key: &TimerKey,
    ) -> Result<Option<TimerRecord>> {
        if let Some(record) = self.store.load(key)? {
            return Ok(Some(record));
        }
        Ok(self.instances.get(key).map(|i| i.record().clone()))
    }

    fn remaining(
        &self,
        key: &TimerKey,
    ) -> Result<Remaining> {
        let now = self.clock.now();
        let end_time = match self.instances.get(key) {
            Some(instance) => Some(instance.end_time()),
            None => self.store.load(key)?.map(|r| r.end_time),
        };

        Ok(match end_time {
            Some(end_time) => {
                let remaining = remaining_until(end_time, now);
                Remaining {
                    remaining,
                    is_active: !remaining.is_zero(),
                }
            }
            None => Remaining::IDLE,
        })
    }

    #[instrument(skip(self), fields(owner = %request.owner_id, kind = %request.kind))]
    async fn start(
        &self,
        request: TimerRequest,
    ) -> Result<TimerHandle> {
        let key = TimerKey::new(request.owner_id, request.kind)?;

        if request.duration.is_zero() {
            return Err(TimerError::InvalidDuration(request.duration).into());
        }
        let max = self.timer_config.max_duration();
        if request.duration > max {
            return Err(TimerError::DurationTooLong {
                requested: request.duration,
                max,
            }
            .into());
        }

        let guard = self.lock_key(&key).await;

        let now = self.clock.now();
        let record = TimerRecord::start(key.clone(), now, request.duration, request.priority, request.label)?;

        if self.retire(&key).await? {
            debug!(%key, "replacing running timer");
        }

        self.store.save(&record)?;
        let (delivery, evicted) = self.schedule_notification(&record).await;
        if !delivery.is_scheduled() {
            self.store.delete(&key)?;
        }

        let generation = self.next_generation();
        let mut instance = TimerInstance::new(record.clone(), generation, delivery.is_scheduled());
        if self.is_foreground() {
            self.spawn_ticks(&mut instance);
        } else {
            self.publish_remaining(&key, request.duration);
        }
        self.instances.insert(key.clone(), instance);

        info!(%key, ?delivery, generation, "timer started");
        self.events.publish(TimerEvent::Started {
            key: key.clone(),
            end_time: record.end_time,
            delivery: delivery.clone(),
        });
        drop(guard);

        if let Some(evicted) = evicted {
            self.demote(evicted).await?;
        }

        Ok(TimerHandle {
            key,
            end_time: record.end_time,
            generation,
            delivery,
        })
    }

    /// Admits, submits and confirms the reminder of `record`.
    ///
    /// Also returns the evicted entry, if any, even when our own submission
    /// failed afterwards: the victim's reminder is gone either way.
    async fn schedule_notification(
        &self,
        record: &TimerRecord,
    ) -> (Delivery, Option<EvictedEntry>) {
        let admitted = match self.budget.admit(record).await {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(key = %record.key, error = %e, "admission failed");
                return (Delivery::NotScheduled(DeliveryWarning::SubmissionFailed(e.to_string())), None);
            }
        };

        let evicted = match admitted {
            AdmitResult::Rejected => {
                return (Delivery::NotScheduled(DeliveryWarning::BudgetExhausted), None);
            }
            AdmitResult::Accepted => None,
            AdmitResult::AcceptedByEviction(evicted) => Some(evicted),
        };

        if let Err(e) = self.channel.submit(self.payloads.build(record)).await {
            warn!(key = %record.key, error = %e, "notification submission failed, timer runs in process only");
            self.budget.release(&record.key).await;
            return (
                Delivery::NotScheduled(DeliveryWarning::SubmissionFailed(e.to_string())),
                evicted,
            );
        }
        self.budget.confirm(&record.key).await;

        let delivery = match &evicted {
            Some(evicted) => Delivery::ScheduledByEviction {
                evicted: evicted.key.clone(),
            },
            None => Delivery::Scheduled,
        };
        (delivery, evicted)
    }

    /// Applies an eviction to the victim's own state: the record goes, the
    /// countdown stays in process. Skipped when the victim was restarted
    /// since it was evicted.
    async fn demote(
        &self,
        evicted: EvictedEntry,
    ) -> Result<()> {
        let key = evicted.key;
        let _guard = self.lock_key(&key).await;

        let record_matches = self
            .store
            .load(&key)?
            .is_some_and(|r| r.created_at == evicted.created_at);
        if record_matches {
            self.store.delete(&key)?;
        }

        let instance_matches = match self.instances.get_mut(&key) {
            Some(mut instance) if instance.created_at() == evicted.created_at => {
                instance.set_scheduled(false);
                true
            }
            _ => false,
        };

        if record_matches || instance_matches {
            info!(%key, "reminder evicted, timer runs in process only");
            self.events.publish(TimerEvent::Evicted { key });
        } else {
            debug!(%key, "evicted timer was replaced meanwhile");
        }
        Ok(())
    }

    /// Stops whatever runs under `key` without touching its record.
    /// Caller holds the key lock. Returns whether anything existed.
    async fn retire(
        &self,
        key: &TimerKey,
    ) -> Result<bool> {
        let instance = self.instances.remove(key).map(|(_, instance)| instance);
        let had_record = self.store.load(key)?.is_some();

        if instance.is_some() || had_record {
            if let Err(e) = self.channel.cancel(&key.to_string()).await {
                warn!(%key, error = %e, "failed to cancel pending notification");
            }
        }
        self.budget.release(key).await;

        Ok(instance.is_some() || had_record)
    }

    async fn cancel(
        &self,
        key: &TimerKey,
    ) -> Result<bool> {
        let guard = self.lock_key(key).await;
        let existed = self.retire(key).await?;
        self.store.delete(key)?;
        self.finish_ticks(key);

        if existed {
            info!(%key, "timer cancelled");
            self.events.publish(TimerEvent::Cancelled { key: key.clone() });
        }
        drop(guard);
        Ok(existed)
    }

    async fn cancel_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<TimerKey>> {
        let mut keys: BTreeSet<TimerKey> = self
            .store
            .load_all(&TimerKey::owner_prefix(owner_id))?
            .into_iter()
            .map(|r| r.key)
            .collect();
        keys.extend(self.instances.iter().map(|i| i.key().clone()));

        let mut cancelled = Vec::new();
        for key in keys.into_iter().filter(|k| k.owner_id() == owner_id) {
            if self.cancel(&key).await? {
                cancelled.push(key);
            }
        }
        Ok(cancelled)
    }

    /// Completes the timer under `key`: record deleted, slot released,
    /// reminder cleared and exactly one `Completed` event. Caller holds the
    /// key lock. Returns false when nothing was running.
    async fn complete_locked(
        &self,
        key: &TimerKey,
    ) -> Result<bool> {
        let instance = self.instances.remove(key).map(|(_, instance)| instance);
        let had_record = self.store.load(key)?.is_some();
        if instance.is_none() && !had_record {
            return Ok(false);
        }

        self.store.delete(key)?;
        self.budget.release(key).await;

        let id = key.to_string();
        if let Err(e) = self.channel.cancel(&id).await {
            warn!(%key, error = %e, "failed to cancel notification of completed timer");
        }
        if let Err(e) = self.channel.clear_delivered(&[id]).await {
            warn!(%key, error = %e, "failed to clear delivered notification");
        }
        self.finish_ticks(key);

        info!(%key, "timer completed");
        self.events.publish(TimerEvent::Completed { key: key.clone() });
        Ok(true)
    }

    /// Handles an expiry notice. Notices of replaced instances are dropped.
    pub(super) async fn complete_if_current(
        &self,
        notice: ExpiryNotice,
    ) -> Result<()> {
        let key = notice.key;
        let _guard = self.lock_key(&key).await;

        let now = self.clock.now();
        let expired = match self.instances.get(&key) {
            Some(instance) if instance.generation() == notice.generation => instance.is_expired(now),
            _ => {
                trace!(%key, generation = notice.generation, "stale expiry notice");
                return Ok(());
            }
        };

        if expired {
            self.complete_locked(&key).await?;
        } else if self.is_foreground() {
            // Wall clock went back after the tick saw the end time
            if let Some(mut instance) = self.instances.get_mut(&key) {
                self.spawn_ticks(&mut instance);
            }
        }
        Ok(())
    }

    pub(super) async fn restore_locked(
        &self,
        key: &TimerKey,
    ) -> Result<RestoreResult> {
        let now = self.clock.now();
        let persisted = self.store.load(key)?;
        let Some(record) = persisted.clone().or_else(|| self.instances.get(key).map(|i| i.record().clone()))
        else {
            return Ok(RestoreResult::Idle);
        };

        if record.is_expired(now) {
            self.complete_locked(key).await?;
            return Ok(RestoreResult::Completed);
        }

        let foreground = self.is_foreground();
        let existing = self
            .instances
            .get(key)
            .map(|i| (i.created_at() == record.created_at, i.is_ticking()));

        let resumed = match existing {
            Some((true, ticking)) => {
                if foreground && !ticking {
                    if let Some(mut instance) = self.instances.get_mut(key) {
                        self.spawn_ticks(&mut instance);
                    }
                    true
                } else {
                    false
                }
            }
            _ => {
                let mut instance = TimerInstance::new(record.clone(), self.next_generation(), persisted.is_some());
                if foreground {
                    self.spawn_ticks(&mut instance);
                }
                self.instances.insert(key.clone(), instance);
                true
            }
        };

        let remaining = remaining_until(record.end_time, now);
        if resumed {
            debug!(%key, ?remaining, "timer restored");
        }
        Ok(RestoreResult::Running { remaining })
    }

    async fn restore_all(&self) -> Result<RestoreReport> {
        let mut keys: BTreeSet<TimerKey> = self.store.load_all("")?.into_iter().map(|r| r.key).collect();
        keys.extend(self.instances.iter().map(|i| i.key().clone()));

        let mut report = RestoreReport::default();
        for key in keys {
            let _guard = self.lock_key(&key).await;
            match self.restore_locked(&key).await? {
                RestoreResult::Running { .. } => report.running.push(key),
                RestoreResult::Completed => report.completed.push(key),
                RestoreResult::Idle => {}
            }
        }

        let pending = match self.channel.list_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "cannot list pending notifications, budget not reconciled");
                return Ok(report);
            }
        };
        let records = self.store.load_all("")?;
        let missing = self.budget.reconcile(&pending, &records).await;

        for key in missing {
            self.reschedule(key, &mut report).await?;
        }

        info!(
            running = report.running.len(),
            completed = report.completed.len(),
            resubmitted = report.resubmitted.len(),
            demoted = report.demoted.len(),
            "restore_all finished"
        );
        Ok(report)
    }

    /// Submits again the reminder of a running record the channel lost.
    async fn reschedule(
        &self,
        key: TimerKey,
        report: &mut RestoreReport,
    ) -> Result<()> {
        let guard = self.lock_key(&key).await;
        let Some(record) = self.store.load(&key)? else {
            return Ok(());
        };
        if record.is_expired(self.clock.now()) {
            return Ok(());
        }

        let (delivery, evicted) = self.schedule_notification(&record).await;
        if delivery.is_scheduled() {
            report.resubmitted.push(key.clone());
        } else {
            info!(%key, ?delivery, "lost reminder could not be rescheduled");
            self.store.delete(&key)?;
            if let Some(mut instance) = self.instances.get_mut(&key) {
                instance.set_scheduled(false);
            }
            report.demoted.push(key.clone());
        }
        drop(guard);

        if let Some(evicted) = evicted {
            self.demote(evicted).await?;
        }
        Ok(())
    }

    async fn cleanup(&self) -> Result<CleanupReport> {
        let now = self.clock.now();
        let mut expired: BTreeSet<TimerKey> = self
            .store
            .load_all("")?
            .into_iter()
            .filter(|r| r.is_expired(now))
            .map(|r| r.key)
            .collect();
        expired.extend(
            self.instances
                .iter()
                .filter(|i| i.is_expired(now))
                .map(|i| i.key().clone()),
        );

        let mut report = CleanupReport::default();
        for key in expired {
            let _guard = self.lock_key(&key).await;
            let still_expired = self
                .current_record(&key)?
                .is_some_and(|r| r.is_expired(self.clock.now()));
            if still_expired && self.complete_locked(&key).await? {
                report.completed.push(key);
            }
        }

        let ours: Vec<String> = self
            .channel
            .list_delivered()
            .await?
            .into_iter()
            .filter(|id| TimerKey::parse(id).is_ok())
            .collect();
        if !ours.is_empty() {
            self.channel.clear_delivered(&ours).await?;
        }
        report.cleared_delivered = ours.len();

        let pending = self.channel.list_pending().await?;
        report.pruned = self.budget.prune(&pending).await;

        // Tick channels opened by `ticks` on keys that never ran
        let unwatched: Vec<TimerKey> = self
            .tick_channels
            .iter()
            .filter(|entry| entry.value().receiver_count() == 0)
            .map(|entry| entry.key().clone())
            .collect();
        for key in unwatched {
            let _guard = self.lock_key(&key).await;
            if !self.instances.contains_key(&key) {
                self.tick_channels.remove_if(&key, |_, tx| tx.receiver_count() == 0);
            }
        }

        debug!(?report, "cleanup finished");
        Ok(report)
    }
}

async fn run_completion_worker(
    inner: Weak<SchedulerInner>,
    mut expiry_rx: mpsc::UnboundedReceiver<ExpiryNotice>,
) -> Result<()> {
    while let Some(notice) = expiry_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if let Err(e) = inner.complete_if_current(notice).await {
            warn!(error = %e, "failed to complete expired timer");
        }
    }
    trace!("completion worker stopped");
    Ok(())
}
