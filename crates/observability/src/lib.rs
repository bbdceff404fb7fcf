//! `stockcast-observability` — tracing/logging initialization.
//!
//! Centralizes subscriber setup so every binary and test harness configures
//! logging the same way.

use tracing_subscriber::EnvFilter;

/// Initialize process-wide tracing.
///
/// JSON output with timestamps, `RUST_LOG`-style filtering, `info` by
/// default. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Human-readable initialization for tests and local debugging.
///
/// Plain formatting, captured per test, `debug` by default.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
