//! `tracing-subscriber` setup for binaries and tests embedding the gate.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset: gate lifecycle at `info`, everything
/// else at `warn`.
pub const DEFAULT_DIRECTIVE: &str = "warn,admission_gate=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, or by [`DEFAULT_DIRECTIVE`]
/// when it is unset. No-op if a subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_DIRECTIVE);
}

/// Like [`init_tracing`] with a caller-chosen fallback directive, for example
/// `"admission_gate=debug"` to watch wake-ups and re-evaluation.
pub fn init_tracing_with_default(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
