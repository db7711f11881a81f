use std::path::Path;

use crate::{Config, RECORDING_MODE_ENV, RecordingMode};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, applies the
    /// recording mode override, then deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion or parsing
    /// fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let mut config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply `TAPEDECK_RECORDING_MODE`, if set
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set to an unknown mode
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        let Ok(value) = std::env::var(RECORDING_MODE_ENV) else {
            return Ok(());
        };

        let mode: RecordingMode = value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid {RECORDING_MODE_ENV} value: `{value}`"))?;

        if mode != self.recording.mode {
            tracing::debug!(from = %self.recording.mode, to = %mode, "recording mode overridden by environment");
        }
        self.recording.mode = mode;
        Ok(())
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory is empty, the float
    /// precision is out of range, or a fingerprint header name is blank
    pub fn validate(&self) -> anyhow::Result<()> {
        let recording = &self.recording;

        if recording.storage_dir.as_os_str().is_empty() {
            anyhow::bail!("recording.storage_dir must not be empty");
        }

        if !(1..=12).contains(&recording.fingerprint.float_precision) {
            anyhow::bail!(
                "recording.fingerprint.float_precision must be between 1 and 12, got {}",
                recording.fingerprint.float_precision
            );
        }

        if recording
            .fingerprint
            .include_headers
            .iter()
            .any(|header| header.trim().is_empty())
        {
            anyhow::bail!("recording.fingerprint.include_headers must not contain blank names");
        }

        if let Some(ref test_id) = recording.test_id
            && test_id.trim().is_empty()
        {
            anyhow::bail!("recording.test_id must not be blank when set");
        }

        Ok(())
    }
}
