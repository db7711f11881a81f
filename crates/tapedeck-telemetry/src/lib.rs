//! Logging for tapedeck
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! single `fmt` layer, text or JSON.

use tapedeck_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Held for the lifetime of the process
///
/// Dropping it is a no-op today; it keeps the call site stable for
/// exporters that need flushing on shutdown.
#[must_use = "hold the guard until the process exits"]
#[derive(Debug)]
pub struct TelemetryGuard {
    _private: (),
}

/// Initialize logging from configuration
///
/// `RUST_LOG` takes precedence over the configured filter. An invalid
/// filter falls back to `default_filter`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: Option<&LoggingConfig>, default_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(config, default_filter);
    let format = config.map(|c| c.format).unwrap_or_default();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry.with(fmt_layer).try_init(),
        LogFormat::Json => registry.with(fmt_layer.json()).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(TelemetryGuard { _private: () })
}

fn build_filter(config: Option<&LoggingConfig>, default_filter: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directive = config.map_or(default_filter, |c| c.filter.as_str());
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(default_filter))
}
