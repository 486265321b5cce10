//! Async runtime glue: tokio spawner, deferred history writes, guarded execution.

pub mod api;
pub mod deferred;
pub mod tokio_spawner;

pub use api::run_admitted;
pub use deferred::DeferredHistorySink;
pub use tokio_spawner::TokioSpawner;
