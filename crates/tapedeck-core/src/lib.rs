//! Shared primitives for the tapedeck error pipeline
//!
//! Runtime error-class descriptors with a deterministic method resolution
//! order, the builtin class hierarchy, the capability trait implemented by
//! provider SDK errors, and the HTTP error shape every failure ends up in.

#![allow(clippy::must_use_candidate)]

pub mod builtins;
pub mod class;
pub mod error;
pub mod provider;
pub mod response;

pub use class::{ErrorType, ErrorTypeRef, MroError};
pub use error::HttpError;
pub use provider::ProviderFailure;
pub use response::{ErrorDetail, HttpErrorResponse, ValidationIssue};
