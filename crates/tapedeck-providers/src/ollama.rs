//! Ollama SDK errors

use std::any::Any;
use std::sync::LazyLock;

use serde_json::Value;
use tapedeck_core::builtins::EXCEPTION;
use tapedeck_core::{ErrorType, ErrorTypeRef, ProviderFailure};
use thiserror::Error;

use crate::config::ProviderConfig;

pub const NAME: &str = "ollama";

pub const SDK_MODULE: &str = "ollama";

pub static RESPONSE_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ResponseError", "ollama._types", &EXCEPTION));

/// The Ollama SDK's `ResponseError`
///
/// Its display text carries a status suffix; [`ProviderFailure::error_message`]
/// returns the bare error so a recording stores the text the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (status code: {status_code})")]
pub struct ResponseError {
    pub error: String,
    pub status_code: u16,
}

impl ResponseError {
    pub fn new(error: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            status_code,
        }
    }
}

impl ProviderFailure for ResponseError {
    fn error_type(&self) -> ErrorTypeRef {
        ErrorTypeRef::clone(&RESPONSE_ERROR)
    }

    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn error_message(&self) -> Option<&str> {
        Some(&self.error)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reconstructor registered for the Ollama SDK
///
/// The SDK error keeps no body, so the recorded one is dropped.
pub fn create_error(status_code: u16, _body: Option<Value>, message: &str) -> Box<dyn ProviderFailure> {
    Box::new(ResponseError::new(message, status_code))
}

pub fn provider() -> ProviderConfig {
    ProviderConfig::new(NAME, SDK_MODULE, create_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_but_message_does_not() {
        let err = ResponseError::new("model 'llama9' not found", 404);
        assert_eq!(err.to_string(), "model 'llama9' not found (status code: 404)");
        assert_eq!(err.error_message(), Some("model 'llama9' not found"));
    }

    #[test]
    fn recorded_error_round_trips() {
        let err = create_error(404, Some(serde_json::json!({"x": 1})), "model not found");
        let err = err.downcast_ref::<ResponseError>().expect("ollama error");
        assert_eq!(err.error, "model not found");
        assert_eq!(err.status_code, 404);
        assert_eq!(err.error_type().qualname(), "ollama._types.ResponseError");
    }

    #[test]
    fn provider_owns_private_submodules() {
        let config = provider();
        assert!(config.owns_module(RESPONSE_ERROR.module()));
    }
}
