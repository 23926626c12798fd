//! Structured logging infrastructure for meshtopo.
//!
//! Centralized subscriber setup with human-readable or JSON output.
//! The level is taken from `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system with human-readable output.
///
/// # Example
/// ```no_run
/// use meshtopo_core::logging;
///
/// logging::init();
/// tracing::info!("Topology store started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output for log aggregation.
///
/// # Example
/// ```no_run
/// use meshtopo_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "meshtopo", "Service started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize logging according to a [`LoggingConfig`].
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json();
    } else {
        init();
    }
}
