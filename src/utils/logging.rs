//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Setup logging for the server.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is a
/// no-op, which keeps tests that start several servers quiet.
pub fn setup_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
