//! `OpenAI` SDK errors
//!
//! Status errors are rebuilt as the SDK's own subclasses, with a synthetic
//! request/response exchange attached, so code matching on the error kind
//! or reading `code`, `type` and `param` behaves the same in replay.

use std::any::Any;
use std::sync::LazyLock;

use http::{Method, Request, Response, StatusCode, Uri};
use serde_json::Value;
use tapedeck_core::builtins::EXCEPTION;
use tapedeck_core::{ErrorType, ErrorTypeRef, ProviderFailure};

use crate::config::ProviderConfig;

/// Registry key stored in recordings
pub const NAME: &str = "openai";

/// Top-level module of the SDK
pub const SDK_MODULE: &str = "openai";

const ERRORS_MODULE: &str = "openai";

const SYNTHETIC_URL: &str = "https://api.openai.com/v1/chat/completions";

pub static OPENAI_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("OpenAIError", ERRORS_MODULE, &EXCEPTION));

pub static API_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("APIError", ERRORS_MODULE, &OPENAI_ERROR));

pub static API_STATUS_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("APIStatusError", ERRORS_MODULE, &API_ERROR));

pub static BAD_REQUEST_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("BadRequestError"));
pub static AUTHENTICATION_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("AuthenticationError"));
pub static PERMISSION_DENIED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| status_subclass("PermissionDeniedError"));
pub static NOT_FOUND_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("NotFoundError"));
pub static CONFLICT_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("ConflictError"));
pub static UNPROCESSABLE_ENTITY_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| status_subclass("UnprocessableEntityError"));
pub static RATE_LIMIT_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("RateLimitError"));
pub static INTERNAL_SERVER_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| status_subclass("InternalServerError"));

fn status_subclass(name: &'static str) -> ErrorTypeRef {
    ErrorType::subclass(name, ERRORS_MODULE, &API_STATUS_ERROR)
}

/// Concrete status-error subclass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatusKind {
    BadRequest,
    Authentication,
    PermissionDenied,
    NotFound,
    Conflict,
    UnprocessableEntity,
    RateLimit,
    InternalServer,
    /// Any status without a dedicated subclass
    Other,
}

impl ApiStatusKind {
    /// Subclass the SDK raises for a status code
    pub const fn from_status(status_code: u16) -> Self {
        match status_code {
            400 => Self::BadRequest,
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::RateLimit,
            500 => Self::InternalServer,
            _ => Self::Other,
        }
    }

    pub fn error_type(self) -> ErrorTypeRef {
        let class = match self {
            Self::BadRequest => &BAD_REQUEST_ERROR,
            Self::Authentication => &AUTHENTICATION_ERROR,
            Self::PermissionDenied => &PERMISSION_DENIED_ERROR,
            Self::NotFound => &NOT_FOUND_ERROR,
            Self::Conflict => &CONFLICT_ERROR,
            Self::UnprocessableEntity => &UNPROCESSABLE_ENTITY_ERROR,
            Self::RateLimit => &RATE_LIMIT_ERROR,
            Self::InternalServer => &INTERNAL_SERVER_ERROR,
            Self::Other => &API_STATUS_ERROR,
        };
        ErrorTypeRef::clone(class)
    }
}

/// An `APIStatusError` as the `OpenAI` SDK raises it
#[derive(Debug)]
pub struct ApiStatusError {
    kind: ApiStatusKind,
    message: String,
    status_code: u16,
    body: Option<Value>,
    code: Option<Value>,
    error_type: Option<String>,
    param: Option<Value>,
    request: Request<()>,
    response: Response<Value>,
}

impl ApiStatusError {
    /// Build the error around an existing exchange
    ///
    /// `code`, `type` and `param` are read from the top level of a JSON
    /// object body; any other body leaves them unset.
    pub fn new(
        kind: ApiStatusKind,
        message: impl Into<String>,
        request: Request<()>,
        response: Response<Value>,
        body: Option<Value>,
    ) -> Self {
        let field = |key: &str| {
            body.as_ref()
                .and_then(Value::as_object)
                .and_then(|object| object.get(key))
                .filter(|value| !value.is_null())
                .cloned()
        };
        let code = field("code");
        let param = field("param");
        let error_type = field("type").and_then(|value| value.as_str().map(ToOwned::to_owned));

        Self {
            kind,
            message: message.into(),
            status_code: response.status().as_u16(),
            body,
            code,
            error_type,
            param,
            request,
            response,
        }
    }

    /// Rebuild the error the SDK would raise for this status
    pub fn from_recorded(status_code: u16, body: Option<Value>, message: &str) -> Self {
        let kind = ApiStatusKind::from_status(status_code);
        let request = synthetic_request();
        let response_status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Response::new(body.clone().unwrap_or_else(|| Value::Object(serde_json::Map::new())));
        *response.status_mut() = response_status;

        let mut error = Self::new(kind, message, request, response, body);
        // keep the recorded code even when it is not a valid HTTP status
        error.status_code = status_code;
        error
    }

    pub const fn kind(&self) -> ApiStatusKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&Value> {
        self.code.as_ref()
    }

    pub fn r#type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    pub fn param(&self) -> Option<&Value> {
        self.param.as_ref()
    }

    pub const fn request(&self) -> &Request<()> {
        &self.request
    }

    pub const fn response(&self) -> &Response<Value> {
        &self.response
    }
}

fn synthetic_request() -> Request<()> {
    let mut request = Request::new(());
    *request.method_mut() = Method::POST;
    *request.uri_mut() = Uri::from_static(SYNTHETIC_URL);
    request
}

impl std::fmt::Display for ApiStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiStatusError {}

impl ProviderFailure for ApiStatusError {
    fn error_type(&self) -> ErrorTypeRef {
        self.kind.error_type()
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

/// Reconstructor registered for the `OpenAI` SDK
pub fn create_error(status_code: u16, body: Option<Value>, message: &str) -> Box<dyn ProviderFailure> {
    Box::new(ApiStatusError::from_recorded(status_code, body, message))
}

pub fn provider() -> ProviderConfig {
    ProviderConfig::new(NAME, SDK_MODULE, create_error)
}
