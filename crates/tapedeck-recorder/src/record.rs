//! On-disk recording format

use std::collections::BTreeMap;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tapedeck_exceptions::Fault;
use tapedeck_providers::ProviderRegistry;

use crate::codec::{SerializedException, deserialize_exception};
use crate::fingerprint;

const LEGACY_MESSAGE: &str = "Unknown error";

/// One stored request/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub test_id: Option<String>,
    pub request: RequestRecord,
    pub response: ResponseRecord,
    /// Original provider IDs mapped to the stable IDs stored in the body
    #[serde(default)]
    pub id_normalization_mapping: BTreeMap<String, String>,
}

/// Request half of a recording, kept for humans reading the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub endpoint: String,
    #[serde(default)]
    pub body: Value,
    /// Fields written by other recorders
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response half of a recording
///
/// Exactly one of `body` or an exception is meaningful: `is_exception`
/// selects. Older files carry only `exception_message`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub is_exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_data: Option<SerializedException>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

impl ResponseRecord {
    /// Successful, non-streamed response
    pub const fn body(body: Value) -> Self {
        Self {
            body: Some(body),
            is_streaming: false,
            is_exception: false,
            exception_data: None,
            exception_message: None,
        }
    }

    /// Streamed response, one element per chunk
    pub fn stream(chunks: Vec<Value>) -> Self {
        Self {
            body: Some(Value::Array(chunks)),
            is_streaming: true,
            is_exception: false,
            exception_data: None,
            exception_message: None,
        }
    }

    /// Failed call
    pub fn exception(data: SerializedException, is_streaming: bool) -> Self {
        Self {
            body: None,
            is_streaming,
            is_exception: true,
            exception_message: Some(data.message.clone()),
            exception_data: Some(data),
        }
    }

    /// The fault a failed call replays as, `None` for successful calls
    ///
    /// Records without structured exception data replay as a plain
    /// `Exception` carrying the stored message.
    pub fn fault(&self, registry: &ProviderRegistry) -> Option<Fault> {
        if !self.is_exception {
            return None;
        }

        let fault = match &self.exception_data {
            Some(data) => deserialize_exception(data, registry),
            None => {
                tracing::warn!("recording predates structured exceptions, replaying as a generic error");
                Fault::exception(self.exception_message.as_deref().unwrap_or(LEGACY_MESSAGE))
            }
        };
        Some(fault)
    }
}

/// Outbound provider call as the recorder sees it
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body,
        }
    }

    /// `POST` with a JSON body
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url, body)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// URL path
    pub fn endpoint(&self) -> String {
        fingerprint::endpoint(&self.url)
    }

    pub(crate) fn to_record(&self) -> RequestRecord {
        RequestRecord {
            method: self.method.as_str().to_owned(),
            url: self.url.clone(),
            endpoint: self.endpoint(),
            body: self.body.clone(),
            extra: Map::new(),
        }
    }
}
