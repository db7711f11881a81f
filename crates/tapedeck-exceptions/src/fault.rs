//! The uniform raised-error value
//!
//! A [`Fault`] is anything a request handler can fail with. It is a closed
//! set: translation and serialization match on the variant instead of
//! probing for attributes.

use std::error::Error as _;
use std::fmt;

use tapedeck_core::builtins::{self, EXCEPTION};
use tapedeck_core::{ErrorTypeRef, ProviderFailure};
use tapedeck_errors::{DomainError, ResourceNotFound};

use crate::classes::VALIDATION_ERROR;
use crate::validation::ValidationError;

/// Error raised by a request handler, live or replayed
#[derive(Debug)]
pub enum Fault {
    /// Request did not match its schema
    Validation(ValidationError),
    /// Known business-rule violation
    Domain(DomainError),
    /// Error raised by an upstream provider SDK
    Provider(Box<dyn ProviderFailure>),
    /// Any other error, identified by its class
    Raised(RaisedError),
}

/// An error known only by its class and message
#[derive(Debug, Clone)]
pub struct RaisedError {
    pub class: ErrorTypeRef,
    pub message: String,
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RaisedError {}

impl Fault {
    /// Error of the given class carrying `message`
    pub fn raised(class: &ErrorTypeRef, message: impl Into<String>) -> Self {
        Self::Raised(RaisedError {
            class: ErrorTypeRef::clone(class),
            message: message.into(),
        })
    }

    /// Plain `Exception(message)`
    pub fn exception(message: impl Into<String>) -> Self {
        Self::raised(&EXCEPTION, message)
    }

    pub fn provider(error: impl ProviderFailure) -> Self {
        Self::Provider(Box::new(error))
    }

    /// Class of the error, walked by the status table
    pub fn error_type(&self) -> ErrorTypeRef {
        match self {
            Self::Validation(_) => ErrorTypeRef::clone(&VALIDATION_ERROR),
            Self::Domain(err) => err.class(),
            Self::Provider(err) => err.error_type(),
            Self::Raised(err) => ErrorTypeRef::clone(&err.class),
        }
    }

    /// Class name, e.g. `NotFoundError`
    pub fn type_name(&self) -> String {
        match self {
            Self::Domain(err) => err.type_name().to_owned(),
            other => other.error_type().name().to_owned(),
        }
    }

    pub const fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_provider(&self) -> Option<&dyn ProviderFailure> {
        match self {
            Self::Provider(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => fmt::Display::fmt(err, f),
            Self::Domain(err) => fmt::Display::fmt(err, f),
            Self::Provider(err) => fmt::Display::fmt(err, f),
            Self::Raised(err) => fmt::Display::fmt(err, f),
        }
    }
}

/// Transparent: display and source are the wrapped error's own
impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(err) => err.source(),
            Self::Provider(err) => err.source(),
            Self::Validation(_) | Self::Raised(_) => None,
        }
    }
}

impl From<ValidationError> for Fault {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.into())
    }
}

impl From<DomainError> for Fault {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ResourceNotFound> for Fault {
    fn from(err: ResourceNotFound) -> Self {
        Self::Domain(err.into())
    }
}

impl From<Box<dyn ProviderFailure>> for Fault {
    fn from(err: Box<dyn ProviderFailure>) -> Self {
        Self::Provider(err)
    }
}

impl From<RaisedError> for Fault {
    fn from(err: RaisedError) -> Self {
        Self::Raised(err)
    }
}

/// I/O failures map onto the builtin `OSError` family
impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Self::raised(&builtins::class_for_io_kind(err.kind()), err.to_string())
    }
}
