//! Domain errors for tapedeck
//!
//! Every error here is a known business-rule violation with exactly one
//! intentional HTTP status. Constructors take structured identifiers and
//! assemble a deterministic, actionable message.

#![allow(clippy::must_use_candidate)]

mod not_found;

use std::fmt::Display;
use std::sync::LazyLock;

use http::StatusCode;
use tapedeck_core::builtins::{EXCEPTION, VALUE_ERROR};
use tapedeck_core::{ErrorType, ErrorTypeRef, HttpError};
use thiserror::Error;

pub use not_found::{ClientListCommand, ResourceNotFound, ResourceNotFoundBuilder};

/// Module that defines the domain error classes
pub const MODULE: &str = "tapedeck_errors";

/// Root of the domain error hierarchy
pub static DOMAIN_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("DomainError", MODULE, &EXCEPTION));

pub static RESOURCE_NOT_FOUND_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ResourceNotFoundError", MODULE, &DOMAIN_ERROR));

/// Invalid parameters are also value errors
pub static INVALID_PARAMETER_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| mixin("InvalidParameterError", [&*VALUE_ERROR, &*DOMAIN_ERROR]));

/// A disabled service is a domain error first, then a value error
pub static SERVICE_NOT_ENABLED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| mixin("ServiceNotEnabledError", [&*DOMAIN_ERROR, &*VALUE_ERROR]));

fn mixin(name: &'static str, bases: [&ErrorTypeRef; 2]) -> ErrorTypeRef {
    let bases = bases.map(ErrorTypeRef::clone);
    ErrorType::with_bases(name, MODULE, &bases).unwrap_or_else(|_| ErrorType::subclass(name, MODULE, &DOMAIN_ERROR))
}

const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred while processing your request.";

/// Known business-rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A referenced resource does not exist
    #[error(transparent)]
    NotFound(#[from] ResourceNotFound),

    /// The model is not in the supported list
    #[error("'{model}' model is not supported. Supported models are: {}", .supported.join(", "))]
    UnsupportedModel { model: String, supported: Vec<String> },

    /// The model exists but is of the wrong type
    #[error("Model '{model}' is of type '{model_type}' rather than the expected type '{expected_type}'")]
    ModelType {
        model: String,
        model_type: String,
        expected_type: String,
    },

    /// A request parameter violates a constraint
    #[error("Invalid value for '{param}': {value}. {constraint}")]
    InvalidParameter {
        param: String,
        value: String,
        constraint: String,
    },

    /// The operation conflicts with the current state
    #[error("{0}")]
    Conflict(String),

    /// Token validation failed during authentication
    #[error("{0}")]
    TokenValidation(String),

    /// A required service is not configured
    #[error(
        "Service '{service}' is not enabled. Please check your configuration and enable the service before trying again.{}",
        .addendum.as_ref().map_or_else(String::new, |extra| format!("\n\n{extra}"))
    )]
    ServiceNotEnabled { service: String, addendum: Option<String> },

    /// An upload exceeds the size limit
    #[error(
        "File size {size} bytes exceeds the maximum allowed upload size of {max} bytes ({} MB)",
        megabytes(.max)
    )]
    FileTooLarge { size: u64, max: u64 },

    /// Server-side failure; `detail` is for server logs only
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    InternalServer { detail: Option<String> },

    /// A domain error rebuilt from a recording
    ///
    /// Only the status and message survive a recording, which is all the
    /// translator and callers depend on.
    #[error("{message}")]
    Replayed {
        type_name: String,
        status: StatusCode,
        message: String,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_precision_loss)]
fn megabytes(bytes: &u64) -> String {
    format!("{:.0}", *bytes as f64 / (1024.0 * 1024.0))
}

impl DomainError {
    pub fn unsupported_model<I, S>(model: impl Into<String>, supported: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnsupportedModel {
            model: model.into(),
            supported: supported.into_iter().map(Into::into).collect(),
        }
    }

    pub fn model_type(
        model: impl Into<String>,
        model_type: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        Self::ModelType {
            model: model.into(),
            model_type: model_type.into(),
            expected_type: expected_type.into(),
        }
    }

    pub fn invalid_parameter(param: impl Into<String>, value: impl Display, constraint: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn token_validation(message: impl Into<String>) -> Self {
        Self::TokenValidation(message.into())
    }

    pub fn service_not_enabled(service: impl Into<String>) -> Self {
        Self::ServiceNotEnabled {
            service: service.into(),
            addendum: None,
        }
    }

    /// Service-not-enabled with provider-specific setup instructions
    pub fn service_not_enabled_with(service: impl Into<String>, addendum: impl Into<String>) -> Self {
        Self::ServiceNotEnabled {
            service: service.into(),
            addendum: Some(addendum.into()),
        }
    }

    pub const fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Internal failure with an optional detail kept out of the public message
    pub fn internal(detail: Option<String>) -> Self {
        Self::InternalServer { detail }
    }

    pub fn replayed(type_name: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Replayed {
            type_name: type_name.into(),
            status,
            message: message.into(),
        }
    }

    /// Class name of the concrete error
    pub fn type_name(&self) -> &str {
        match self {
            Self::NotFound(not_found) => not_found.type_name(),
            Self::UnsupportedModel { .. } => "UnsupportedModelError",
            Self::ModelType { .. } => "ModelTypeError",
            Self::InvalidParameter { .. } => "InvalidParameterError",
            Self::Conflict(_) => "ConflictError",
            Self::TokenValidation(_) => "TokenValidationError",
            Self::ServiceNotEnabled { .. } => "ServiceNotEnabledError",
            Self::FileTooLarge { .. } => "FileTooLargeError",
            Self::InternalServer { .. } => "InternalServerError",
            Self::Replayed { type_name, .. } => type_name,
        }
    }

    /// Class of the concrete error, including any builtin mixins
    pub fn class(&self) -> ErrorTypeRef {
        match self {
            Self::NotFound(not_found) if not_found.type_name() == RESOURCE_NOT_FOUND_ERROR.name() => {
                ErrorTypeRef::clone(&RESOURCE_NOT_FOUND_ERROR)
            }
            Self::NotFound(not_found) => {
                ErrorType::subclass(not_found.type_name().to_owned(), MODULE, &RESOURCE_NOT_FOUND_ERROR)
            }
            Self::InvalidParameter { .. } => ErrorTypeRef::clone(&INVALID_PARAMETER_ERROR),
            Self::ServiceNotEnabled { .. } => ErrorTypeRef::clone(&SERVICE_NOT_ENABLED_ERROR),
            other => ErrorType::subclass(other.type_name().to_owned(), MODULE, &DOMAIN_ERROR),
        }
    }

    /// Detail for server logs; never part of the public message
    pub fn internal_detail(&self) -> Option<&str> {
        match self {
            Self::InternalServer { detail } => detail.as_deref(),
            _ => None,
        }
    }
}

impl HttpError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedModel { .. } | Self::ModelType { .. } | Self::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TokenValidation(_) => StatusCode::UNAUTHORIZED,
            Self::ServiceNotEnabled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalServer { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Replayed { status, .. } => *status,
        }
    }

    fn error_type(&self) -> &str {
        match self.status_code().as_u16() {
            404 => "not_found_error",
            409 => "conflict_error",
            401 => "authentication_error",
            503 => "service_unavailable_error",
            413 => "request_too_large_error",
            400..=499 => "invalid_request_error",
            _ => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}
