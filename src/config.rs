//! Configuration types for Padrec

use serde::{Deserialize, Serialize};

use crate::storage::{EmulatorIdentity, EMULATOR_CAPACITY};
use crate::{PadrecError, Result};

/// How hard a write is pushed to storage before it returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Flush the handle so the OS owns the bytes
    #[default]
    Flush,
    /// Flush and `sync_data`, surviving power loss
    Sync,
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity stamped into new recordings
    #[serde(default)]
    pub emulator: EmulatorConfig,
    /// Recording defaults
    #[serde(default)]
    pub recording: RecordingConfig,
}

/// Emulator identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Product name
    pub name: String,
    /// Major version
    #[serde(default)]
    pub version_major: u32,
    /// Minor version
    #[serde(default)]
    pub version_minor: u32,
    /// Patch version
    #[serde(default)]
    pub version_patch: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        let current = EmulatorIdentity::current();
        Self {
            name: current.name,
            version_major: current.major,
            version_minor: current.minor,
            version_patch: current.patch,
        }
    }
}

impl EmulatorConfig {
    /// Identity to stamp into headers
    #[must_use]
    pub fn identity(&self) -> EmulatorIdentity {
        EmulatorIdentity::new(
            self.name.clone(),
            self.version_major,
            self.version_minor,
            self.version_patch,
        )
    }
}

/// Recording defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Author stamped into new recordings
    #[serde(default)]
    pub author: String,
    /// Write durability
    #[serde(default)]
    pub durability: Durability,
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PadrecError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PadrecError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.emulator.name.is_empty() {
            return Err(PadrecError::ConfigError(
                "emulator.name cannot be empty".to_string(),
            ));
        }

        // The header truncates silently; a config that would be cut is a mistake.
        let identity = self.emulator.identity().to_string();
        if identity.len() >= EMULATOR_CAPACITY {
            return Err(PadrecError::ConfigError(format!(
                "Emulator identity too long: {} > {}",
                identity.len(),
                EMULATOR_CAPACITY - 1
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            [emulator]
            name = "PCSX2"
            version_major = 1
            version_minor = 7
            version_patch = 0

            [recording]
            author = "runner"
            durability = "sync"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.emulator.identity().to_string(), "PCSX2-1.7.0");
        assert_eq!(config.recording.author, "runner");
        assert_eq!(config.recording.durability, Durability::Sync);
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.emulator.name, "padrec");
        assert!(config.recording.author.is_empty());
        assert_eq!(config.recording.durability, Durability::Flush);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = r#"
            [emulator]
            name = "emu"

            [recording]
            durability = "flush"
        "#;
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.emulator.identity().to_string(), "emu-0.0.0");
    }

    #[test]
    fn test_invalid_config_empty_name() {
        let config: Config = toml::from_str("[emulator]\nname = \"\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_long_identity() {
        let mut config = Config::default();
        config.emulator.name = "x".repeat(EMULATOR_CAPACITY);
        assert!(matches!(
            config.validate(),
            Err(PadrecError::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_durability() {
        let parsed: std::result::Result<Config, _> =
            toml::from_str("[recording]\ndurability = \"never\"");
        assert!(parsed.is_err());
    }
}
