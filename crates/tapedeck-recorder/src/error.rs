use std::path::PathBuf;

use tapedeck_core::builtins::RUNTIME_ERROR;
use tapedeck_exceptions::Fault;
use thiserror::Error;

/// Errors reading or writing recordings on disk
#[derive(Debug, Error)]
pub enum StoreError {
    /// Hash is empty or has characters other than ASCII alphanumerics, `_` and `-`
    #[error("invalid recording hash: `{0}`")]
    InvalidHash(String),

    /// Filesystem operation failed
    #[error("recording I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recording file exists but is not a valid recording
    #[error("malformed recording {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Recording could not be encoded
    #[error("failed to encode recording: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors surfaced by a recorded call
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The call failed, live or replayed
    #[error(transparent)]
    Fault(#[from] Fault),

    /// Replay mode found nothing stored for this request
    #[error("Recording not found for request hash: {hash}")]
    RecordingNotFound { hash: String, endpoint: String },

    /// Recording storage failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReplayError {
    /// The fault the call failed with, if it got that far
    pub const fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Recorder failures surface to handlers as `RuntimeError`
impl From<ReplayError> for Fault {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::Fault(fault) => fault,
            other => Self::raised(&RUNTIME_ERROR, other.to_string()),
        }
    }
}
