use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use washday::Error;
use washday::LocalNotificationCenter;
use washday::Result;
use washday::SchedulerBuilder;
use washday::SystemClock;
use washday::TimerEvent;
use washday::WashdayConfig;

/// How often delivered reminders are collected from the notification centre
const REMINDER_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = WashdayConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&config.service.log_dir)?;

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let clock = Arc::new(SystemClock);
    let center = Arc::new(LocalNotificationCenter::new(config.budget.capacity, clock.clone()));
    let scheduler = SchedulerBuilder::new(config)
        .clock(clock)
        .channel(center.clone())
        .build()?;

    let mut events = scheduler.subscribe();

    let restored = scheduler.restore_all().await?;
    let cleaned = scheduler.cleanup().await?;
    info!(
        running = restored.running.len(),
        completed = restored.completed.len() + cleaned.completed.len(),
        "timers restored"
    );

    let maintenance = scheduler.spawn_maintenance(graceful_rx.clone());

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let mut shutdown = graceful_rx;
    let mut reminder_tick = tokio::time::interval(REMINDER_POLL_INTERVAL);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!("shutdown signal received.");
                break;
            }
            Some(event) = events.recv() => {
                match event {
                    TimerEvent::Completed { key } => info!(%key, "timer completed"),
                    TimerEvent::Evicted { key } => warn!(%key, "reminder evicted, timer runs in process only"),
                    TimerEvent::ClockSkewDetected { drift_ms } => warn!(drift_ms, "system clock changed"),
                    other => info!(event = ?other, "timer event"),
                }
            }
            _ = reminder_tick.tick() => {
                for payload in center.take_delivered_payloads() {
                    info!(id = %payload.id, title = %payload.title, body = %payload.body, "reminder delivered");
                }
            }
        }
    }

    if let Err(e) = maintenance.await {
        error!("maintenance task failed: {:?}", e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(format!("SIGINT handler: {e}")))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(format!("SIGTERM handler: {e}")))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown server..");
    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::Fatal(format!("Failed to send shutdown signal: {e}"))
    })?;

    info!("Shutdown completed");
    Ok(())
}

/// Logs to stdout and to a non-blocking file writer under `log_dir`.
pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(log_dir, "washday.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(EnvFilter::from_default_env());
    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| Error::Fatal(format!("Failed to initialise logging: {e}")))?;

    Ok(guard)
}
