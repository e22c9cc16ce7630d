//! # Logging
//!
//! Stderr logging with verbosity gating, per the error-handling policy:
//! recoverable conditions are logged and execution continues. `env_logger`
//! is the default path; with the `tracing-spans` feature, the channel
//! cycle and status socket are additionally instrumented with spans so a
//! deployment can attach a structured subscriber.

use log::{debug, error, info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate. Verbosity is
/// controlled by `RUST_LOG` as usual.
pub fn init_logger() {
    env_logger::init();
}

/// Initializes logging plus, when built with `tracing-spans`, a
/// `tracing-subscriber` so span timing for the channel cycle shows up
/// alongside `log`-based messages.
pub fn init_enhanced_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logger();

    #[cfg(feature = "tracing-spans")]
    {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    Ok(())
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a debug message.
pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}
