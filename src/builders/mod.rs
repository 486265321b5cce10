//! Builders to construct the scheduler from configuration.

pub mod gate_builder;

pub use gate_builder::{build_history_sink, build_scheduler, GateBuilder};
