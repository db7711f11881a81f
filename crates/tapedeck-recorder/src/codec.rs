//! Exception records
//!
//! A raised [`Fault`] is stored as a small JSON object tagged with a
//! category, and rebuilt from it on replay so callers observe an error of
//! the same class with the same status and message. Decoding never fails:
//! malformed or partial records degrade to a plain `Exception`.

use std::str::FromStr;

use http::StatusCode;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use strum::{Display, EnumString};
use tapedeck_core::HttpError;
use tapedeck_errors::DomainError;
use tapedeck_exceptions::{Fault, status_table};
use tapedeck_providers::{ProviderRegistry, UNKNOWN_PROVIDER};

const DEFAULT_TYPE: &str = "Exception";
const DEFAULT_MESSAGE: &str = "Unknown error";
const DEFAULT_STATUS: u16 = 500;

/// How an exception record is rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum ExceptionCategory {
    /// Domain error with its declared status
    #[strum(serialize = "llama_stack")]
    Domain,
    /// Provider SDK error, rebuilt by the provider's reconstructor
    #[strum(serialize = "provider_sdk")]
    ProviderSdk,
    /// Class from the status table, rebuilt by name
    #[strum(serialize = "builtin")]
    Builtin,
    /// Anything else, rebuilt as a plain `Exception`
    #[default]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Recorded form of a raised error
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedException {
    pub category: ExceptionCategory,
    /// Class name of the original error
    pub type_name: String,
    pub message: String,
    pub status_code: Option<u16>,
    /// Registry name of the provider that raised it
    pub provider: Option<String>,
    /// Opaque provider payload
    pub body: Option<Value>,
}

impl SerializedException {
    /// Read a record leniently
    ///
    /// Missing or mistyped fields fall back to `unknown`, `Exception`,
    /// `Unknown error` and status 500.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).filter(|v| !v.is_null());

        let category = match field("category") {
            None => ExceptionCategory::Unknown,
            Some(raw) => raw
                .as_str()
                .and_then(|name| ExceptionCategory::from_str(name).ok())
                .unwrap_or_else(|| {
                    tracing::warn!(category = %raw, "unrecognized exception category, replaying as unknown");
                    ExceptionCategory::Unknown
                }),
        };

        let type_name = field("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TYPE)
            .to_owned();

        let message = match field("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => DEFAULT_MESSAGE.to_owned(),
        };

        let status_code = field("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());

        Self {
            category,
            type_name,
            message,
            status_code,
            provider: field("provider").and_then(Value::as_str).map(ToOwned::to_owned),
            body: field("body").cloned(),
        }
    }

    fn status_or_default(&self) -> u16 {
        self.status_code.unwrap_or(DEFAULT_STATUS)
    }
}

impl Serialize for SerializedException {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("category", &self.category.to_string())?;
        map.serialize_entry("type", &self.type_name)?;
        map.serialize_entry("message", &self.message)?;

        match self.category {
            ExceptionCategory::Domain => {
                map.serialize_entry("status_code", &self.status_or_default())?;
            }
            ExceptionCategory::ProviderSdk => {
                map.serialize_entry("provider", self.provider.as_deref().unwrap_or(UNKNOWN_PROVIDER))?;
                map.serialize_entry("status_code", &self.status_or_default())?;
                map.serialize_entry("body", &self.body)?;
            }
            ExceptionCategory::Builtin | ExceptionCategory::Unknown => {}
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for SerializedException {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Describe a fault for recording
///
/// Checked in order: domain errors, provider errors, classes named in the
/// status table, everything else. Never fails and keeps the message.
pub fn serialize_exception(fault: &Fault, registry: &ProviderRegistry) -> SerializedException {
    match fault {
        Fault::Domain(err) => SerializedException {
            category: ExceptionCategory::Domain,
            type_name: err.type_name().to_owned(),
            message: err.to_string(),
            status_code: Some(err.status_code().as_u16()),
            provider: None,
            body: None,
        },
        Fault::Provider(err) => SerializedException {
            category: ExceptionCategory::ProviderSdk,
            type_name: err.error_type().name().to_owned(),
            message: err.error_message().map_or_else(|| err.to_string(), ToOwned::to_owned),
            status_code: Some(err.status_code()),
            provider: Some(registry.detect_provider(err.as_ref()).to_owned()),
            body: err.body().cloned(),
        },
        other => {
            let type_name = other.type_name();
            let category = if status_table().contains_name(&type_name) {
                ExceptionCategory::Builtin
            } else {
                ExceptionCategory::Unknown
            };

            SerializedException {
                category,
                type_name,
                message: other.to_string(),
                status_code: None,
                provider: None,
                body: None,
            }
        }
    }
}

/// Rebuild the fault a record describes
pub fn deserialize_exception(record: &SerializedException, registry: &ProviderRegistry) -> Fault {
    match record.category {
        ExceptionCategory::Domain => {
            let status = StatusCode::from_u16(record.status_or_default()).unwrap_or_else(|_| {
                tracing::warn!(status_code = record.status_or_default(), "invalid domain error status in recording");
                StatusCode::INTERNAL_SERVER_ERROR
            });
            DomainError::replayed(&record.type_name, status, &record.message).into()
        }
        ExceptionCategory::ProviderSdk => registry
            .create_provider_error(
                record.provider.as_deref().unwrap_or(UNKNOWN_PROVIDER),
                record.status_or_default(),
                record.body.clone(),
                &record.message,
            )
            .into(),
        ExceptionCategory::Builtin => match status_table().class_by_name(&record.type_name) {
            Some(class) => Fault::raised(class, &record.message),
            None => Fault::exception(&record.message),
        },
        ExceptionCategory::Unknown => Fault::exception(&record.message),
    }
}
