use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tapedeck_core::ProviderFailure;

use crate::error::RegistryError;

/// Rebuilds a provider's error from recorded `(status_code, body, message)`
pub type CreateError = Arc<dyn Fn(u16, Option<Value>, &str) -> Box<dyn ProviderFailure> + Send + Sync>;

/// Exception handling for one provider SDK
///
/// `sdk_module` is the SDK's top-level module. An error belongs to the
/// provider when its defining module is that module or nested under it.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Registry key, stored in recordings
    pub name: String,
    /// Top-level module of the SDK, e.g. `openai`
    pub sdk_module: &'static str,
    /// Reconstructor for recorded errors
    pub create_error: CreateError,
}

impl ProviderConfig {
    pub fn new<F>(name: impl Into<String>, sdk_module: &'static str, create_error: F) -> Self
    where
        F: Fn(u16, Option<Value>, &str) -> Box<dyn ProviderFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            sdk_module,
            create_error: Arc::new(create_error),
        }
    }

    /// Whether an error defined in `module` was raised by this SDK
    pub fn owns_module(&self, module: &str) -> bool {
        module
            .strip_prefix(self.sdk_module)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }

    /// Check the config before it is registered
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the module identity is not
    /// a dotted module path
    pub fn validate(&self) -> Result<(), RegistryError> {
        fn module_path() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| {
                Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("must be valid regex")
            })
        }

        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName {
                name: self.name.clone(),
            });
        }

        if !module_path().is_match(self.sdk_module) {
            return Err(RegistryError::InvalidModule {
                name: self.name.clone(),
                module: self.sdk_module.to_owned(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("sdk_module", &self.sdk_module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::GenericProviderError;

    fn config(name: &str, module: &'static str) -> ProviderConfig {
        ProviderConfig::new(name, module, |status, body, message| {
            Box::new(GenericProviderError::new(status, body, message))
        })
    }

    #[test]
    fn module_ownership_respects_segment_boundaries() {
        let openai = config("openai", "openai");
        assert!(openai.owns_module("openai"));
        assert!(openai.owns_module("openai._exceptions"));
        assert!(!openai.owns_module("openai_compat.errors"));
        assert!(!openai.owns_module("httpx"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = config("", "openai").validate().unwrap_err();
        assert_eq!(err, RegistryError::InvalidName { name: String::new() });
    }

    #[test]
    fn malformed_module_is_rejected() {
        let err = config("broken", "not a module").validate().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModule { .. }));

        assert!(config("nested", "google.genai").validate().is_ok());
    }
}
