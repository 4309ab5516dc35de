use crate::model::Snapshot;
use crate::store::EnvironmentalStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns the single queue consumer. Per-site ordering follows from the
/// single receiver; cross-site interleaving is unspecified. A failed
/// write is logged and the snapshot dropped.
pub(super) fn spawn(
    store: Arc<dyn EnvironmentalStore>,
    mut rx: mpsc::Receiver<Snapshot>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                snapshot = rx.recv() => match snapshot {
                    Some(snapshot) => {
                        if let Err(err) = store.record(&snapshot).await {
                            tracing::error!(
                                error=%err,
                                site=%snapshot.site_id,
                                "failed to record snapshot; dropping"
                            );
                        }
                    }
                    None => break,
                }
            }
        }
        tracing::info!("snapshot persister shut down");
    })
}
