//! Transcoding configuration
//!
//! Settings are plain serde structs with defaults for every field, so a
//! partial YAML or TOML document is enough to override a single value.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::entity::resource_type::SLUG_PASSWORD_AND_DESCRIPTION;

/// Default prefix of exported file names
pub const DEFAULT_EXPORT_FILENAME_PREFIX: &str = "passbolt-export";

/// Default cap on the number of data rows accepted by an import
pub const DEFAULT_MAX_IMPORT_ROWS: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("Configuration parsing failed: {message}")]
    Parse { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodingConfig {
    /// Resource type slug given to imported rows
    pub default_resource_type_slug: String,
    pub export_filename_prefix: String,
    /// Maximum number of data rows per import, 0 for unlimited
    pub max_import_rows: usize,
    /// Trim surrounding whitespace of imported cells
    pub trim_cells: bool,
}

impl Default for TranscodingConfig {
    fn default() -> Self {
        Self {
            default_resource_type_slug: SLUG_PASSWORD_AND_DESCRIPTION.to_string(),
            export_filename_prefix: DEFAULT_EXPORT_FILENAME_PREFIX.to_string(),
            max_import_rows: DEFAULT_MAX_IMPORT_ROWS,
            trim_cells: false,
        }
    }
}

impl TranscodingConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` file, or YAML for any other extension
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        debug!("Loading transcoding configuration from: {:?}", path);

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
        let config = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        info!("Transcoding configuration loaded from: {:?}", path);
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_resource_type_slug.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "default_resource_type_slug".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.export_filename_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "export_filename_prefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.export_filename_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "export_filename_prefix".to_string(),
                reason: "must not contain path separators".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = TranscodingConfig::default();
        assert_eq!(config.default_resource_type_slug, "password-and-description");
        assert_eq!(config.export_filename_prefix, "passbolt-export");
        assert_eq!(config.max_import_rows, 10_000);
        assert!(!config.trim_cells);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml() {
        let config = TranscodingConfig::from_yaml_str("max_import_rows: 5\ntrim_cells: true\n").unwrap();
        assert_eq!(config.max_import_rows, 5);
        assert!(config.trim_cells);
        assert_eq!(config.export_filename_prefix, DEFAULT_EXPORT_FILENAME_PREFIX);
    }

    #[test]
    fn test_toml() {
        let config = TranscodingConfig::from_toml_str(
            "export_filename_prefix = \"vault\"\ndefault_resource_type_slug = \"password-string\"\n",
        )
        .unwrap();
        assert_eq!(config.export_filename_prefix, "vault");
        assert_eq!(config.default_resource_type_slug, "password-string");
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = TranscodingConfig {
            max_import_rows: 0,
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(TranscodingConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        assert_matches!(
            TranscodingConfig::from_yaml_str("export_filename_prefix: ''"),
            Err(ConfigError::Invalid { ref field, .. }) if field == "export_filename_prefix"
        );
        assert_matches!(
            TranscodingConfig::from_toml_str("default_resource_type_slug = \" \""),
            Err(ConfigError::Invalid { ref field, .. }) if field == "default_resource_type_slug"
        );
        assert_matches!(
            TranscodingConfig::from_yaml_str("export_filename_prefix: a/b"),
            Err(ConfigError::Invalid { .. })
        );
        assert_matches!(
            TranscodingConfig::from_yaml_str("max_import_rows: many"),
            Err(ConfigError::Parse { .. })
        );
    }
}
