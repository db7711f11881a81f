use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// One failed field in a request that did not match its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path to the offending field, outermost first
    pub loc: Vec<String>,
    /// Human-readable description
    pub msg: String,
    /// Machine-readable failure kind
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Error detail: plain text, or the structured list for validation failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation { errors: Vec<ValidationIssue> },
}

impl ErrorDetail {
    /// The plain text detail, if this is not a validation detail
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(message) => Some(message),
            Self::Validation { .. } => None,
        }
    }
}

impl From<String> for ErrorDetail {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ErrorDetail {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

/// The HTTP error every failure is translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    #[serde(with = "status_code")]
    pub status_code: StatusCode,
    pub detail: ErrorDetail,
}

impl HttpErrorResponse {
    pub fn new(status_code: StatusCode, detail: impl Into<ErrorDetail>) -> Self {
        Self {
            status_code,
            detail: detail.into(),
        }
    }

    /// Build a response from any error that knows its own status
    pub fn from_http_error<E: HttpError + ?Sized>(error: &E) -> Self {
        Self::new(error.status_code(), error.client_message())
    }
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for HttpErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code;
        (status, axum::Json(self)).into_response()
    }
}

mod status_code {
    use http::StatusCode;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(D::Error::custom)
    }
}
