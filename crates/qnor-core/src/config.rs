//! Configuration file loading
//!
//! A [`DriverConfig`] can be described in RON or TOML. Missing fields take
//! their defaults, so a file only needs to name what differs from a
//! W25Q256 with default timing:
//!
//! ```toml
//! phase_timeout_ms = 1000
//!
//! [geometry]
//! capacity_mbit = 128
//!
//! [poll]
//! interval_us = 100
//! max_polls = 50000
//! ```

use std::fs;
use std::path::Path;
use std::string::{String, ToString};

use thiserror::Error;

use crate::driver::DriverConfig;

/// Error loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON syntax or schema error
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// TOML syntax or schema error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Parsed, but describes an impossible chip
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DriverConfig {
    /// Parse a RON document
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = ron::from_str(content)?;
        config.validated()
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = toml::from_str(content)?;
        config.validated()
    }

    /// Load a `.ron` or `.toml` file, chosen by extension
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Self::from_ron(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(ConfigError::Validation(std::format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.geometry
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        if self.phase_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "phase_timeout_ms must be non-zero".to_string(),
            ));
        }
        log::debug!(
            "config: {} Mbit, {} B pages, poll every {} us",
            self.geometry.capacity_mbit,
            self.geometry.page_size,
            self.poll.interval_us
        );
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PollConfig;
    use crate::geometry::ChipGeometry;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(DriverConfig::from_toml("").unwrap(), DriverConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = DriverConfig::from_toml(
            r#"
            phase_timeout_ms = 1000

            [geometry]
            capacity_mbit = 128

            [poll]
            interval_us = 100
            max_polls = 50000
            "#,
        )
        .unwrap();

        assert_eq!(config.geometry, ChipGeometry::W25Q128);
        assert_eq!(config.phase_timeout_ms, 1000);
        assert_eq!(
            config.poll,
            PollConfig {
                interval_us: 100,
                max_polls: Some(50000),
            }
        );
    }

    #[test]
    fn test_ron() {
        let config = DriverConfig::from_ron(
            "(geometry: (capacity_mbit: 64), poll: (interval_us: 0, max_polls: Some(10)))",
        )
        .unwrap();
        assert_eq!(config.geometry.capacity_mbit, 64);
        assert_eq!(config.poll.max_polls, Some(10));
        assert_eq!(config.phase_timeout_ms, 5000);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            DriverConfig::from_toml("[geometry]\npage_size = 300"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            DriverConfig::from_toml("phase_timeout_ms = 0"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            DriverConfig::from_toml("[geometry]\npage_size = \"big\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            DriverConfig::from_ron("(geometry: 12)"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(std::format!("qnor-config-{}.toml", std::process::id()));
        fs::write(&path, "[geometry]\ncapacity_mbit = 128\n").unwrap();
        let config = DriverConfig::load_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.geometry, ChipGeometry::W25Q128);

        assert!(matches!(
            DriverConfig::load_file(dir.join("qnor-config-missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
