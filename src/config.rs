//! Configuration for the sensorlog capture tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistent settings: where captures land and which sources are
/// recorded when the CLI is not told otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory capture sessions are written into
    pub output_dir: PathBuf,

    /// Source keys recorded by default
    pub sources: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensorlog");

        Self {
            output_dir: data_dir.join("captures"),
            sources: vec!["accel".to_string(), "gravity".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensorlog")
            .join("config.json")
    }

    /// Ensure the output directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Parse a comma-separated source list ("accel, gravity") into keys:
    /// trimmed, lowercased, de-duplicated, order preserved.
    pub fn parse_sources(s: &str) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for part in s.split(',') {
            let key = part.trim().to_lowercase();
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            Config::parse_sources("accel,gravity"),
            vec!["accel", "gravity"]
        );
        assert_eq!(
            Config::parse_sources(" Accel , GYRO ,accel,"),
            vec!["accel", "gyro"]
        );
        assert!(Config::parse_sources("").is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sources, vec!["accel", "gravity"]);
        assert!(config.output_dir.ends_with("captures"));
    }

    #[test]
    fn test_ensure_directories_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().join("nested").join("captures"),
            sources: vec!["accel".to_string()],
        };
        assert!(!config.output_dir.exists());
        config.ensure_directories().unwrap();
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config {
            output_dir: PathBuf::from("/tmp/captures"),
            sources: vec!["gyro".to_string()],
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_dir, config.output_dir);
        assert_eq!(back.sources, config.sources);
    }
}
