//! Builder wiring a [`Scheduler`] to the history backend named in [`GateConfig`].

use std::sync::Arc;

use crate::config::{GateConfig, HistoryBackendConfig};
use crate::core::{HistorySink, InMemoryHistorySink, NoopHistorySink, Scheduler, SchedulerError};
use crate::infra::JsonLinesHistorySink;
#[cfg(feature = "tokio-runtime")]
use crate::runtime::{DeferredHistorySink, TokioSpawner};

/// Construct the history sink a configuration asks for.
///
/// # Errors
///
/// Returns [`SchedulerError::Backend`] if a file-backed sink cannot be prepared.
pub fn build_history_sink(
    history: &HistoryBackendConfig,
) -> Result<Arc<dyn HistorySink>, SchedulerError> {
    let sink: Arc<dyn HistorySink> = match history {
        HistoryBackendConfig::Disabled => Arc::new(NoopHistorySink),
        HistoryBackendConfig::InMemory { capacity } => Arc::new(InMemoryHistorySink::new(*capacity)),
        HistoryBackendConfig::JsonLines { path } => Arc::new(JsonLinesHistorySink::new(path)?),
    };
    Ok(sink)
}

/// Build a scheduler from configuration using the configured history backend.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] for invalid configuration, or a
/// backend error if the history sink cannot be created.
pub fn build_scheduler(cfg: &GateConfig) -> Result<Scheduler, SchedulerError> {
    GateBuilder::new(cfg.clone()).build()
}

/// Step-by-step construction with an optional history sink override.
pub struct GateBuilder {
    config: GateConfig,
    history: Option<Arc<dyn HistorySink>>,
    #[cfg(feature = "tokio-runtime")]
    spawner: Option<TokioSpawner>,
}

impl GateBuilder {
    /// Start from a configuration.
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self {
            config,
            history: None,
            #[cfg(feature = "tokio-runtime")]
            spawner: None,
        }
    }

    /// Configuration the builder will apply.
    #[must_use]
    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Override the cap.
    #[must_use]
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.config.max_concurrent = max_concurrent;
        self
    }

    /// Use a caller-supplied sink instead of the configured backend.
    #[must_use]
    pub fn history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    /// Defer history writes onto `spawner`'s runtime. Implies `defer_history`.
    #[cfg(feature = "tokio-runtime")]
    #[must_use]
    pub fn spawner(mut self, spawner: TokioSpawner) -> Self {
        self.config.defer_history = true;
        self.spawner = Some(spawner);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for invalid configuration or
    /// when deferred history is requested outside a tokio runtime, or a
    /// backend error if the history sink cannot be created.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        self.config
            .validate()
            .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
        let history = match self.history {
            Some(sink) => sink,
            None => build_history_sink(&self.config.history)?,
        };
        #[cfg(feature = "tokio-runtime")]
        let history = if self.config.defer_history {
            let spawner = self
                .spawner
                .or_else(TokioSpawner::current)
                .ok_or_else(|| {
                    SchedulerError::InvalidConfig(
                        "defer_history needs a spawner or a running tokio runtime".into(),
                    )
                })?;
            Arc::new(DeferredHistorySink::new(history, spawner)) as Arc<dyn HistorySink>
        } else {
            history
        };
        tracing::info!(
            "building scheduler: max_concurrent={}, history={:?}, deferred={}, admit_timeout={:?}",
            self.config.max_concurrent,
            self.config.history,
            self.config.defer_history,
            self.config.default_admit_timeout()
        );
        let mut scheduler = Scheduler::new(self.config.max_concurrent)?.with_history(history);
        if let Some(timeout) = self.config.default_admit_timeout() {
            scheduler = scheduler.with_default_admit_timeout(timeout);
        }
        Ok(scheduler)
    }
}
