//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// GitHub issue source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository owner
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Environment variable holding an optional API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Issues per page (GitHub caps this at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound on pages fetched per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "linxiap".to_string()
}

fn default_repo() -> String {
    "battle-rank-system".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    50
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "battle-rank-system".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: default_owner(),
            repo: default_repo(),
            token_env: default_token_env(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub source: SourceConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        if self.source.per_page == 0 || self.source.per_page > 100 {
            return Err(ConfigError::ValidationError(
                "Source per_page must be between 1 and 100".to_string(),
            ));
        }

        if self.source.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "Source max_pages must be greater than 0".to_string(),
            ));
        }

        if self.source.owner.trim().is_empty() || self.source.repo.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Source owner and repo must be set".to_string(),
            ));
        }

        if url::Url::parse(&self.source.api_base).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Source api_base is not a valid URL: {}",
                self.source.api_base
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.output_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.source.owner, "linxiap");
        assert_eq!(config.source.repo, "battle-rank-system");
    }

    #[test]
    fn test_source_config_default() {
        let source = SourceConfig::default();

        assert_eq!(source.api_base, "https://api.github.com");
        assert_eq!(source.token_env, "GITHUB_TOKEN");
        assert_eq!(source.per_page, 100);
        assert_eq!(source.timeout_seconds, 30);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.source.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_per_page() {
        let mut config = AppConfig::default();
        config.source.per_page = 101;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_api_base() {
        let mut config = AppConfig::default();
        config.source.api_base = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_missing_repo() {
        let mut config = AppConfig::default();
        config.source.repo = " ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            output_dir = "/srv/stats"

            [source]
            owner = "someone"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/srv/stats"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.source.owner, "someone");
        assert_eq!(config.source.repo, "battle-rank-system");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.output_dir, parsed.output_dir);
        assert_eq!(config.source.max_pages, parsed.source.max_pages);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[source]\ntimeout_seconds = 0\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
