use http::StatusCode;
use tapedeck_core::{ErrorDetail, HttpErrorResponse};

use crate::fault::Fault;
use crate::mapping::translate_to_http;

/// Detail returned for errors nothing else recognizes
pub const GENERIC_ERROR_DETAIL: &str = "Internal server error: An unexpected error occurred.";

/// Convert any fault into the HTTP error returned to the client
///
/// Tried in order: validation errors, domain errors, the status table,
/// provider errors with their upstream status, then a sanitized 500.
/// Never fails.
pub fn translate_exception(fault: &Fault) -> HttpErrorResponse {
    match fault {
        Fault::Validation(err) => {
            return HttpErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ErrorDetail::Validation {
                    errors: err.issues().to_vec(),
                },
            );
        }
        Fault::Domain(err) => {
            if let Some(detail) = err.internal_detail() {
                tracing::error!(error_type = err.type_name(), detail, "internal server error");
            }
            return HttpErrorResponse::from_http_error(err);
        }
        Fault::Provider(_) | Fault::Raised(_) => {}
    }

    if let Some(response) = translate_to_http(fault) {
        return response;
    }

    if let Some(provider) = fault.as_provider() {
        match StatusCode::from_u16(provider.status_code()) {
            Ok(status) => return HttpErrorResponse::new(status, provider.to_string()),
            Err(_) => {
                tracing::warn!(
                    status_code = provider.status_code(),
                    error_type = %provider.error_type(),
                    "provider error carries an invalid HTTP status"
                );
            }
        }
    }

    tracing::error!(error_type = %fault.type_name(), error = %fault, "unhandled error");
    HttpErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_DETAIL)
}

/// Whether the fault came from a provider SDK
///
/// Domain errors carry a status too but are never provider errors.
pub const fn is_provider_sdk_error(fault: &Fault) -> bool {
    matches!(fault, Fault::Provider(_))
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for Fault {
    fn into_response(self) -> axum::response::Response {
        translate_exception(&self).into_response()
    }
}
