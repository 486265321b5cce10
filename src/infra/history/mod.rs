//! History sink backends.

pub mod jsonl;

pub use jsonl::JsonLinesHistorySink;
