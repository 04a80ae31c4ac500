use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backend::StorageBackend;
use crate::reconcile::run_cycle;

/// Runs one cycle immediately, then keeps running cycles every time the
/// interval elapses. The interval is measured from cycle completion, so a
/// slow cycle pushes the whole schedule back. Shutdown is cooperative and
/// only honored between cycles; an in-flight cycle always finishes.
pub async fn run(
    backend: &dyn StorageBackend,
    local_root: &Path,
    interval: Duration,
    shutdown: CancellationToken,
) {
    run_cycle(backend, local_root).await;
    loop {
        info!("next sync in {} seconds", interval.as_secs());
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => run_cycle(backend, local_root).await,
        }
    }
    info!("scheduler stopped");
}
