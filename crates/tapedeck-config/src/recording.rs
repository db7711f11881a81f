use std::path::PathBuf;

use serde::Deserialize;
use strum::{Display, EnumString};

/// How calls to a provider are intercepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RecordingMode {
    /// Pass through to the provider, store nothing
    #[default]
    Live,
    /// Always call the provider and store the outcome
    Record,
    /// Never call the provider; a missing recording is an error
    Replay,
    /// Replay when a recording exists, record otherwise
    RecordIfMissing,
}

/// Recording configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordingConfig {
    #[serde(default)]
    pub mode: RecordingMode,
    /// Root directory for recordings
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Test identifier scoping recordings to a per-test directory
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            mode: RecordingMode::default(),
            storage_dir: default_storage_dir(),
            test_id: None,
            fingerprint: FingerprintConfig::default(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("tests/recordings")
}

/// Which parts of a request feed its fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FingerprintConfig {
    /// Header names folded into the fingerprint, matched case-insensitively
    #[serde(default)]
    pub include_headers: Vec<String>,
    /// Decimal places kept when folding floats
    #[serde(default = "default_float_precision")]
    pub float_precision: u32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            include_headers: Vec::new(),
            float_precision: default_float_precision(),
        }
    }
}

const fn default_float_precision() -> u32 {
    5
}
