//! Status codes for builtin and third-party error classes
//!
//! Lookup walks the error's resolution order and stops at the first
//! mapped class, so subclasses inherit their ancestor's status and
//! multiple inheritance resolves by declared base order.

use std::collections::HashMap;
use std::sync::LazyLock;

use http::StatusCode;
use tapedeck_core::builtins::{CONNECTION_ERROR, NOT_IMPLEMENTED_ERROR, PERMISSION_ERROR, TIMEOUT_ERROR, VALUE_ERROR};
use tapedeck_core::{ErrorType, ErrorTypeRef, HttpErrorResponse};
use tapedeck_providers::openai;

use crate::classes::{ACCESS_DENIED_ERROR, AUTHENTICATION_REQUIRED_ERROR, httpx};
use crate::fault::Fault;

static STATUS_TABLE: LazyLock<StatusTable> = LazyLock::new(StatusTable::standard);

/// The process-wide status table
pub fn status_table() -> &'static StatusTable {
    &STATUS_TABLE
}

/// One mapped class
#[derive(Debug, Clone)]
pub struct StatusMapping {
    pub class: ErrorTypeRef,
    pub status: StatusCode,
    /// Detail used when the error's own message is empty
    pub fallback: &'static str,
}

/// Class → (status, fallback detail)
#[derive(Debug, Default)]
pub struct StatusTable {
    entries: Vec<StatusMapping>,
    by_qualname: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl StatusTable {
    /// The table used by translation and replay
    pub fn standard() -> Self {
        let mut table = Self::default();
        table
            .insert(&VALUE_ERROR, StatusCode::BAD_REQUEST, "Invalid value")
            .insert(&openai::BAD_REQUEST_ERROR, StatusCode::BAD_REQUEST, "Bad request")
            .insert(&PERMISSION_ERROR, StatusCode::FORBIDDEN, "Permission denied")
            .insert(&ACCESS_DENIED_ERROR, StatusCode::FORBIDDEN, "Permission denied")
            .insert(&CONNECTION_ERROR, StatusCode::BAD_GATEWAY, "Connection error")
            .insert(&httpx::CONNECT_ERROR, StatusCode::BAD_GATEWAY, "Connection error")
            .insert(&TIMEOUT_ERROR, StatusCode::GATEWAY_TIMEOUT, "Operation timed out")
            .insert(&NOT_IMPLEMENTED_ERROR, StatusCode::NOT_IMPLEMENTED, "Not implemented")
            .insert(
                &AUTHENTICATION_REQUIRED_ERROR,
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            );
        table
    }

    /// Map a class; a later mapping for the same class replaces the earlier one
    pub fn insert(&mut self, class: &ErrorTypeRef, status: StatusCode, fallback: &'static str) -> &mut Self {
        let mapping = StatusMapping {
            class: ErrorTypeRef::clone(class),
            status,
            fallback,
        };

        if let Some(&index) = self.by_qualname.get(&class.qualname()) {
            self.entries[index] = mapping;
            return self;
        }

        let index = self.entries.len();
        self.by_qualname.insert(class.qualname(), index);
        self.by_name.entry(class.name().to_owned()).or_insert(index);
        self.entries.push(mapping);
        self
    }

    /// First mapping found walking `class` in resolution order
    pub fn lookup(&self, class: &ErrorType) -> Option<&StatusMapping> {
        class
            .mro()
            .find_map(|ancestor| self.by_qualname.get(&ancestor.qualname()))
            .map(|&index| &self.entries[index])
    }

    /// Mapped class with this bare name, used to rebuild recorded errors
    pub fn class_by_name(&self, name: &str) -> Option<&ErrorTypeRef> {
        self.by_name.get(name).map(|&index| &self.entries[index].class)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusMapping> {
        self.entries.iter()
    }
}

/// Translate through the status table alone
///
/// The detail is the error's message, or the class fallback when the
/// message is empty. Returns `None` when no ancestor is mapped.
pub fn translate_to_http(fault: &Fault) -> Option<HttpErrorResponse> {
    let mapping = status_table().lookup(&fault.error_type())?;
    let message = fault.to_string();
    let detail = if message.is_empty() {
        mapping.fallback.to_owned()
    } else {
        message
    };
    Some(HttpErrorResponse::new(mapping.status, detail))
}
