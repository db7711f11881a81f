use std::sync::OnceLock;

use serde_json::Value;
use tapedeck_core::{ErrorType, ProviderFailure};

use crate::config::ProviderConfig;
use crate::error::RegistryError;
use crate::generic::GenericProviderError;
use crate::{ollama, openai};

/// Name reported for errors no registered SDK owns
pub const UNKNOWN_PROVIDER: &str = "unknown";

static GLOBAL: OnceLock<ProviderRegistry> = OnceLock::new();

/// Ordered table of provider SDK integrations
///
/// Detection returns the first registered provider whose SDK module owns
/// the error's module, so registration order decides overlaps.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every SDK integration shipped in this crate
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled provider fails validation
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(openai::provider())?.register(ollama::provider())?;
        Ok(registry)
    }

    /// Validate and append a provider
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or its name is taken
    pub fn register(&mut self, config: ProviderConfig) -> Result<&mut Self, RegistryError> {
        config.validate()?;

        if self.get(&config.name).is_some() {
            return Err(RegistryError::Duplicate { name: config.name });
        }

        tracing::debug!(provider = %config.name, sdk_module = config.sdk_module, "registered provider");
        self.providers.push(config);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|provider| provider.name == name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|provider| provider.name.as_str())
    }

    /// Name of the provider whose SDK defines `class`, or `"unknown"`
    pub fn detect(&self, class: &ErrorType) -> &str {
        self.providers
            .iter()
            .find(|provider| provider.owns_module(class.module()))
            .map_or(UNKNOWN_PROVIDER, |provider| provider.name.as_str())
    }

    /// Name of the provider that raised `error`, or `"unknown"`
    pub fn detect_provider(&self, error: &dyn ProviderFailure) -> &str {
        self.detect(&error.error_type())
    }

    /// Rebuild a recorded provider error
    ///
    /// Unknown names yield a [`GenericProviderError`] that still carries the
    /// recorded status and body.
    pub fn create_provider_error(
        &self,
        name: &str,
        status_code: u16,
        body: Option<Value>,
        message: &str,
    ) -> Box<dyn ProviderFailure> {
        match self.get(name) {
            Some(provider) => (provider.create_error)(status_code, body, message),
            None => {
                tracing::debug!(provider = name, status_code, "no provider registered, using generic error");
                Box::new(GenericProviderError::new(status_code, body, message))
            }
        }
    }
}

/// Install the process-wide registry
///
/// Must run before any recording is serialized or replayed.
///
/// # Errors
///
/// Returns an error if a registry was already installed, including
/// implicitly by an earlier call to [`global`]
pub fn init(registry: ProviderRegistry) -> Result<&'static ProviderRegistry, RegistryError> {
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInitialized)?;
    Ok(global())
}

/// The process-wide registry, defaulting to [`ProviderRegistry::builtin`]
pub fn global() -> &'static ProviderRegistry {
    GLOBAL.get_or_init(|| {
        ProviderRegistry::builtin().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to register bundled providers");
            ProviderRegistry::new()
        })
    })
}
