//! Configuration models for the admission gate and its history backend.

pub mod gate;

pub use gate::{GateConfig, HistoryBackendConfig};
