//! Configuration management for services embedding the event contracts.
//!
//! Settings are layered from optional configuration files and environment
//! variables. Every field has a default, so an empty environment yields a
//! usable configuration.
//!
//! ## Example Configuration
//!
//! ```toml
//! [telemetry]
//! service_name = "frolf-bot-backend"
//! log_level = "debug"
//! json_logging = true
//!
//! [error_reporter]
//! application = "frolf-bot-backend"
//! error_topic = "error.frolf.bot"
//! log_level = "WARN"
//! capture_call_site = true
//! ```

use anyhow::{Context, Result};
use frolf_events_domain::DEFAULT_ERROR_TOPIC;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Environment variable selecting the environment-specific config file
pub const ENV_SELECTOR: &str = "FROLF_ENV";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "FROLF";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub error_reporter: ErrorReporterConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json_logging: bool,
}

/// Error reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReporterConfig {
    /// Application name logged with every reported error
    #[serde(default = "default_service_name")]
    pub application: String,

    /// Topic error events are published on
    #[serde(default = "default_error_topic")]
    pub error_topic: String,

    /// Level reported errors are logged at
    #[serde(default)]
    pub log_level: ReportLevel,

    /// Append the reporting function, file and line to the event context
    #[serde(default = "default_capture_call_site")]
    pub capture_call_site: bool,
}

/// Log level of reported errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportLevel {
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn", alias = "WARNING", alias = "warning")]
    Warn,
    #[default]
    #[serde(alias = "error")]
    Error,
}

impl ReportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Default value functions
fn default_service_name() -> String {
    "frolf-bot-events".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_error_topic() -> String {
    DEFAULT_ERROR_TOPIC.to_string()
}

fn default_capture_call_site() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl Default for ErrorReporterConfig {
    fn default() -> Self {
        Self {
            application: default_service_name(),
            error_topic: default_error_topic(),
            log_level: ReportLevel::default(),
            capture_call_site: default_capture_call_site(),
        }
    }
}

impl ContractsConfig {
    /// Load configuration from configuration files and environment variables.
    ///
    /// The configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. config/default.{toml,yaml,json} (if exists)
    /// 3. config/{environment}.* (if exists, where environment is from FROLF_ENV)
    /// 4. Environment variables (prefixed with FROLF_)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use frolf_events_common::config::ContractsConfig;
    ///
    /// // FROLF_ERROR_REPORTER__ERROR_TOPIC=error.staging overrides the topic
    /// let config = ContractsConfig::load().expect("Failed to load configuration");
    /// println!("Errors go to {}", config.error_reporter.error_topic);
    /// ```
    pub fn load() -> Result<Self> {
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &env, None)
    }

    /// Load from an explicit config directory.
    ///
    /// `env_vars` replaces the process environment as the source of
    /// `FROLF_*` overrides when given.
    pub fn load_from(dir: &Path, env: &str, env_vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(env)).required(false))
            // Example: FROLF_TELEMETRY__LOG_LEVEL=debug
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()
            .context("Failed to build configuration")?;

        let contracts_config: ContractsConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        contracts_config.validate()?;

        Ok(contracts_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.telemetry.service_name.trim().is_empty() {
            anyhow::bail!("Service name is required");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.telemetry.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.telemetry.log_level,
                valid_log_levels.join(", ")
            );
        }

        if self.error_reporter.application.trim().is_empty() {
            anyhow::bail!("Error reporter application name is required");
        }

        let topic = &self.error_reporter.error_topic;
        if topic.is_empty() || topic.chars().any(char::is_whitespace) {
            anyhow::bail!("Invalid error topic '{}'", topic);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = ContractsConfig::default();
        assert_eq!(config.telemetry.service_name, "frolf-bot-events");
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.error_reporter.error_topic, "error.frolf.bot");
        assert_eq!(config.error_reporter.log_level, ReportLevel::Error);
        assert!(config.error_reporter.capture_call_site);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContractsConfig::load_from(dir.path(), "test", Some(HashMap::new())).unwrap();
        assert_eq!(config, ContractsConfig::default());
    }

    #[test]
    fn test_env_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[telemetry]\nservice_name = \"backend\"\nlog_level = \"debug\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            "[telemetry]\nlog_level = \"warn\"\n[error_reporter]\nlog_level = \"WARN\"\n",
        )
        .unwrap();

        let config = ContractsConfig::load_from(dir.path(), "staging", Some(HashMap::new())).unwrap();
        assert_eq!(config.telemetry.service_name, "backend");
        assert_eq!(config.telemetry.log_level, "warn");
        assert_eq!(config.error_reporter.log_level, ReportLevel::Warn);
    }

    #[test]
    fn test_environment_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[error_reporter]\nerror_topic = \"error.file\"\n").unwrap();

        let vars = HashMap::from([
            ("FROLF_ERROR_REPORTER__ERROR_TOPIC".to_string(), "error.env".to_string()),
            ("FROLF_ERROR_REPORTER__CAPTURE_CALL_SITE".to_string(), "false".to_string()),
        ]);
        let config = ContractsConfig::load_from(dir.path(), "development", Some(vars)).unwrap();
        assert_eq!(config.error_reporter.error_topic, "error.env");
        assert!(!config.error_reporter.capture_call_site);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = ContractsConfig::default();
        config.telemetry.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_error_topic_rejected() {
        let mut config = ContractsConfig::default();
        config.error_reporter.error_topic = "error frolf".into();
        assert!(config.validate().is_err());
    }
}
