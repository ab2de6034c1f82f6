use tokio::task::JoinHandle;
use tracing::error;
use tracing::trace;

use crate::Result;

/// Spawns a named background task, logging its error if it stops with one.
pub(crate) fn spawn_task<Fut>(
    name: &str,
    task: Fut,
) -> JoinHandle<()>
where
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        match task.await {
            Ok(()) => trace!("spawned task: {name} finished"),
            Err(e) => error!("spawned task: {name} stopped or encountered an error: {:?}", e),
        }
    })
}
