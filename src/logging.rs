//! Logging setup.
//!
//! `RUST_LOG` controls the filter (default `info`). Output goes to stderr so
//! `tillprint preview` can pipe the receipt text cleanly.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logger() {
    init_logger_with_level("info");
}

/// Like [`init_logger`], with `level` used when `RUST_LOG` is unset.
pub fn init_logger_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
