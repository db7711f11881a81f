//! Recording and replay of provider calls
//!
//! Provider responses, and the errors providers raise, are stored as JSON
//! files keyed by a request fingerprint. Replay rebuilds errors with their
//! original class so callers matching on error types behave the same
//! offline.

#![allow(clippy::must_use_candidate)]

pub mod codec;
mod error;
pub mod fingerprint;
mod record;
mod recorder;
mod store;

pub use codec::{ExceptionCategory, SerializedException, deserialize_exception, serialize_exception};
pub use error::{ReplayError, StoreError};
pub use record::{ApiRequest, Recording, RequestRecord, ResponseRecord};
pub use recorder::{ApiRecorder, ChunkStream};
pub use store::{ResponseStorage, read_recording};
