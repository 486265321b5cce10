//! History sink wrapper that moves persistence off the release path.

use std::sync::Arc;

use crate::core::{HistoryEntry, HistorySink, SchedulerError, Spawn};

/// Forwards each record to an inner sink on a background task.
///
/// `record` returns as soon as the write is scheduled; failures of the inner
/// sink are logged from the background task. Records are not ordered relative
/// to each other.
pub struct DeferredHistorySink<S> {
    inner: Arc<dyn HistorySink>,
    spawner: S,
}

impl<S> DeferredHistorySink<S>
where
    S: Spawn + Send + Sync,
{
    /// Wrap `inner`, scheduling writes on `spawner`.
    pub fn new(inner: Arc<dyn HistorySink>, spawner: S) -> Self {
        Self { inner, spawner }
    }
}

impl<S> HistorySink for DeferredHistorySink<S>
where
    S: Spawn + Send + Sync,
{
    fn record(&self, entry: &HistoryEntry) -> Result<(), SchedulerError> {
        let inner = Arc::clone(&self.inner);
        let entry = entry.clone();
        self.spawner.spawn(async move {
            let id = entry.id;
            match tokio::task::spawn_blocking(move || inner.record(&entry)).await {
                Ok(Ok(())) => tracing::debug!("history recorded for task {}", id),
                Ok(Err(e)) => tracing::error!("deferred history write for task {} failed: {}", id, e),
                Err(e) => tracing::error!("deferred history writer for task {} did not finish: {}", id, e),
            }
        });
        Ok(())
    }
}
