use std::any::Any;

use serde_json::Value;

use crate::class::ErrorTypeRef;

/// Capability shared by every error raised by an upstream provider SDK
///
/// A provider error carries the exact HTTP status the upstream returned,
/// which is passed through to clients unchanged. Each SDK adapter has its
/// own concrete type; callers that need the concrete type use
/// [`downcast_ref`](trait.ProviderFailure.html#method.downcast_ref).
pub trait ProviderFailure: std::error::Error + Send + Sync + 'static {
    /// Class of the error as the SDK defines it
    fn error_type(&self) -> ErrorTypeRef;

    /// HTTP status code returned by the provider
    fn status_code(&self) -> u16;

    /// Opaque response payload, if the SDK kept one
    fn body(&self) -> Option<&Value> {
        None
    }

    /// Clean error text when the SDK decorates its display output
    fn error_message(&self) -> Option<&str> {
        None
    }

    /// Upcast for downcasting to the concrete SDK error
    fn as_any(&self) -> &dyn Any;
}

impl dyn ProviderFailure {
    /// Borrow the concrete SDK error, if it is a `T`
    pub fn downcast_ref<T: ProviderFailure>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Whether the concrete SDK error is a `T`
    pub fn is<T: ProviderFailure>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
