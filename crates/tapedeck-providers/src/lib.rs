//! Provider SDK integrations
//!
//! Each integration names the SDK's top-level module, used to recognize
//! errors that SDK raised, and a reconstructor that rebuilds the SDK's own
//! error from a recording. The registry is assembled once at startup and
//! is read-only afterwards.

#![allow(clippy::must_use_candidate)]

mod config;
mod error;
pub mod generic;
pub mod ollama;
pub mod openai;
mod registry;

pub use config::{CreateError, ProviderConfig};
pub use error::RegistryError;
pub use generic::GenericProviderError;
pub use registry::{ProviderRegistry, UNKNOWN_PROVIDER, global, init};
