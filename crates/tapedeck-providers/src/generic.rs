use std::any::Any;
use std::sync::LazyLock;

use serde_json::Value;
use tapedeck_core::builtins::EXCEPTION;
use tapedeck_core::{ErrorType, ErrorTypeRef, ProviderFailure};
use thiserror::Error;

pub static GENERIC_PROVIDER_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("GenericProviderError", "tapedeck_providers.generic", &EXCEPTION));

/// Provider error rebuilt when the recording names no registered provider
///
/// Keeps the status code and body so translation still yields the
/// upstream status.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct GenericProviderError {
    pub status_code: u16,
    pub body: Option<Value>,
    pub message: String,
}

impl GenericProviderError {
    pub fn new(status_code: u16, body: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body,
            message: message.into(),
        }
    }
}

impl ProviderFailure for GenericProviderError {
    fn error_type(&self) -> ErrorTypeRef {
        ErrorTypeRef::clone(&GENERIC_PROVIDER_ERROR)
    }

    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
