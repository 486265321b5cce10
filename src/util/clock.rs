//! Wall-clock helpers.
//!
//! Timestamps are carried as milliseconds since the Unix epoch so they serialize
//! the same way into every history backend.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Returns `0` if the system clock reports a time before the epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Elapsed seconds between two millisecond timestamps, clamped at zero.
///
/// The wall clock can step backwards between admission and completion; a
/// negative duration is reported as `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_secs(start_ms: u128, end_ms: u128) -> f64 {
    end_ms.saturating_sub(start_ms) as f64 / 1000.0
}
