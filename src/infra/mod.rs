//! Infrastructure adapters for history persistence.

pub mod history;

pub use history::JsonLinesHistorySink;
