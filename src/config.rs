use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub storage: StorageConfig,
    pub features: FeatureConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Where the question bank is read from
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub source: String,
}

/// Key-value storage connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub url: String,
}

/// Feature switches injected into the session at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FeatureConfig {
    pub premium_enabled: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            premium_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub directory: PathBuf,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Config {
            dataset: DatasetConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            features: FeatureConfig::from_env()?,
            export: ExportConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        };

        log_system_event!(config, "Configuration loaded successfully");
        config.log_configuration_summary();

        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    fn log_configuration_summary(&self) {
        info!(
            dataset_source = %self.dataset.source,
            storage_url_masked = %mask_sensitive_data(&self.storage.url),
            premium_enabled = self.features.premium_enabled,
            export_directory = %self.export.directory.display(),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.storage.url.starts_with("sqlite:") {
            return Err(anyhow!("DATABASE_URL must start with 'sqlite:'"));
        }

        if self.dataset.source.trim().is_empty() {
            return Err(anyhow!("DATASET_SOURCE must name a file path or an http(s) URL"));
        }

        // Only the default directive is checked, per-target overrides pass through
        let default_level = self
            .logging
            .level
            .split(',')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&default_level.as_str()) {
            warn!("Invalid log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl DatasetConfig {
    fn from_env() -> Result<Self> {
        let source = env::var("DATASET_SOURCE")
            .unwrap_or_else(|_| "public/data/data-25.json".to_string());

        Ok(DatasetConfig { source })
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:ccse_study.db".to_string());

        Ok(StorageConfig { url })
    }
}

impl FeatureConfig {
    fn from_env() -> Result<Self> {
        let raw = env::var("PREMIUM_ENABLED").unwrap_or_else(|_| "true".to_string());

        let premium_enabled = match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                return Err(anyhow!(
                    "Invalid PREMIUM_ENABLED value: '{}'. Use true or false",
                    raw
                ));
            }
        };

        Ok(FeatureConfig { premium_enabled })
    }
}

impl ExportConfig {
    fn from_env() -> Result<Self> {
        let directory = env::var("EXPORT_DIRECTORY").unwrap_or_else(|_| ".".to_string());

        Ok(ExportConfig {
            directory: PathBuf::from(directory),
        })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,ccse_study=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
