use thiserror::Error;

/// Provider registration errors
///
/// Raised while the registry is assembled at startup, never afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Provider name is empty or contains whitespace
    #[error("provider name must be a non-empty identifier, got {name:?}")]
    InvalidName { name: String },

    /// SDK module identity is not a dotted module path
    #[error("provider '{name}' has an invalid SDK module identity: {module:?}")]
    InvalidModule { name: String, module: String },

    /// A provider with this name is already registered
    #[error("duplicate provider name: {name}")]
    Duplicate { name: String },

    /// The process-wide registry was already installed
    #[error("provider registry is already initialized")]
    AlreadyInitialized,
}
