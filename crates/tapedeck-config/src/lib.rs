#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod logging;
pub mod recording;

use serde::Deserialize;

pub use env::ExpandError;
pub use logging::{LogFormat, LoggingConfig};
pub use recording::{FingerprintConfig, RecordingConfig, RecordingMode};

/// Environment variable that overrides `recording.mode`
pub const RECORDING_MODE_ENV: &str = "TAPEDECK_RECORDING_MODE";

/// Top-level tapedeck configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Record/replay configuration
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}
