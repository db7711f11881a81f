//! Error classification and HTTP translation
//!
//! Every failure a handler can raise is a [`Fault`]. [`translate_exception`]
//! is the single funnel from a fault to the HTTP error sent to the client,
//! used identically for live and replayed calls.

#![allow(clippy::must_use_candidate)]

pub mod classes;
mod fault;
mod mapping;
mod translation;
mod validation;

pub use fault::{Fault, RaisedError};
pub use mapping::{StatusMapping, StatusTable, status_table, translate_to_http};
pub use translation::{GENERIC_ERROR_DETAIL, is_provider_sdk_error, translate_exception};
pub use validation::ValidationError;
