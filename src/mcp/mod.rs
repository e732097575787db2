pub mod tools;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tokio::sync::Mutex;

use crate::store::Workspace;

use tools::BundlerMcpServer;

/// Floor for the flush ticker so a zero `persist_delay_ms` does not spin.
const MIN_FLUSH_TICK: Duration = Duration::from_millis(50);

pub async fn serve(workspace: Workspace) -> Result<()> {
    let tick = Duration::from_millis(workspace.settings().persist_delay_ms).max(MIN_FLUSH_TICK);
    let workspace = Arc::new(Mutex::new(workspace));
    let flusher = tokio::spawn(flush_when_due(Arc::clone(&workspace), tick));

    let server = BundlerMcpServer::new(Arc::clone(&workspace));
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    flusher.abort();
    workspace.lock().await.flush()?;
    Ok(())
}

/// Writes debounced store changes while the server runs.
async fn flush_when_due(workspace: Arc<Mutex<Workspace>>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match workspace.lock().await.flush_if_due(Instant::now()) {
            Ok(true) => tracing::debug!("flushed debounced store changes"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "failed to persist store changes"),
        }
    }
}
