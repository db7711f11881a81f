//! Error classes raised outside the builtin hierarchy that still carry a
//! fixed HTTP status

use std::sync::LazyLock;

use tapedeck_core::builtins::{EXCEPTION, RUNTIME_ERROR, VALUE_ERROR};
use tapedeck_core::{ErrorType, ErrorTypeRef};

/// Request payload failed schema validation
pub static VALIDATION_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ValidationError", "tapedeck_exceptions.validation", &VALUE_ERROR));

/// Caller lacks access to a resource
pub static ACCESS_DENIED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("AccessDeniedError", "tapedeck_exceptions.access", &RUNTIME_ERROR));

/// Request carried no credentials where some are required
pub static AUTHENTICATION_REQUIRED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("AuthenticationRequiredError", "tapedeck_exceptions.access", &EXCEPTION));

/// HTTP client transport errors, as raised by `httpx`
pub mod httpx {
    use super::{EXCEPTION, ErrorType, ErrorTypeRef, LazyLock};

    pub const MODULE: &str = "httpx";

    pub static HTTP_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| ErrorType::subclass("HTTPError", MODULE, &EXCEPTION));

    pub static TRANSPORT_ERROR: LazyLock<ErrorTypeRef> =
        LazyLock::new(|| ErrorType::subclass("TransportError", MODULE, &HTTP_ERROR));

    pub static NETWORK_ERROR: LazyLock<ErrorTypeRef> =
        LazyLock::new(|| ErrorType::subclass("NetworkError", MODULE, &TRANSPORT_ERROR));

    pub static CONNECT_ERROR: LazyLock<ErrorTypeRef> =
        LazyLock::new(|| ErrorType::subclass("ConnectError", MODULE, &NETWORK_ERROR));

    pub static READ_ERROR: LazyLock<ErrorTypeRef> =
        LazyLock::new(|| ErrorType::subclass("ReadError", MODULE, &NETWORK_ERROR));
}
