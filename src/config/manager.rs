//! Configuration Manager

use super::Config;
use crate::metrics::{CategorySet, ExportCategory};
use crate::Result;
use anyhow::{bail, Context};
use std::path::Path;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config.validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(host) = std::env::var("OPENTSDB_HOST") {
            if !host.is_empty() {
                config.opentsdb.host = Some(host);
            }
        }

        if let Ok(port) = std::env::var("OPENTSDB_PORT") {
            config.opentsdb.port = port.parse::<u16>()
                .with_context(|| format!("Invalid OPENTSDB_PORT: {}", port))?;
        }

        if let Ok(namespace) = std::env::var("OPENTSDB_NAMESPACE") {
            config.opentsdb.namespace = namespace;
        }

        if let Ok(data) = std::env::var("OPENTSDB_DATA") {
            config.opentsdb.data = parse_category_list(&data)
                .with_context(|| format!("Invalid OPENTSDB_DATA: {}", data))?;
        }

        if let Ok(url) = std::env::var("OPENTSDB_RUN_URL") {
            config.run.url = url;
        }

        if let Ok(runs) = std::env::var("OPENTSDB_RUNS") {
            config.run.runs = runs.parse::<u32>()
                .with_context(|| format!("Invalid OPENTSDB_RUNS: {}", runs))?;
        }

        if let Ok(log_level) = std::env::var("OPENTSDB_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_category_list(list: &str) -> Result<Vec<ExportCategory>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<ExportCategory>())
        .collect()
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_opentsdb_config()
            .with_context(|| "OpenTSDB configuration validation failed")?;

        self.validate_run_config()
            .with_context(|| "Run configuration validation failed")?;

        self.validate_logging_config()
            .with_context(|| "Logging configuration validation failed")?;

        Ok(())
    }

    fn validate_opentsdb_config(&self) -> Result<()> {
        if let Some(host) = &self.opentsdb.host {
            if host.trim().is_empty() {
                bail!("opentsdb.host must not be blank");
            }
            if self.opentsdb.port == 0 {
                bail!("opentsdb.port must be greater than 0");
            }
        }

        if self.opentsdb.namespace.is_empty() {
            bail!("opentsdb.namespace must not be empty");
        }

        if self.opentsdb.namespace.chars().any(char::is_whitespace) {
            bail!("opentsdb.namespace must not contain whitespace");
        }

        if self.opentsdb.data.is_empty() {
            bail!("opentsdb.data must name at least one category");
        }

        Ok(())
    }

    fn validate_run_config(&self) -> Result<()> {
        if self.run.runs == 0 {
            bail!("run.runs must be at least 1");
        }

        self.hostname()?;

        for (i, browser) in self.run.browsers.iter().enumerate() {
            if browser.is_empty() {
                bail!("Browser {} has an empty name", i);
            }
        }

        Ok(())
    }

    fn validate_logging_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        host: Option<&str>,
        port: Option<u16>,
        namespace: Option<&str>,
        data: Option<&str>,
        url: Option<&str>,
        runs: Option<u32>,
    ) {
        if let Some(host) = host {
            self.opentsdb.host = Some(host.to_string());
            tracing::info!("CLI override: OpenTSDB host set to {}", host);
        }

        if let Some(port) = port {
            self.opentsdb.port = port;
            tracing::info!("CLI override: OpenTSDB port set to {}", port);
        }

        if let Some(namespace) = namespace {
            self.opentsdb.namespace = namespace.to_string();
            tracing::info!("CLI override: namespace set to {}", namespace);
        }

        if let Some(data) = data {
            match parse_category_list(data) {
                Ok(categories) => {
                    self.opentsdb.data = categories;
                    tracing::info!("CLI override: export data set to {}", data);
                }
                Err(e) => tracing::warn!("Invalid export data provided: {} ({})", data, e),
            }
        }

        if let Some(url) = url {
            self.run.url = url.to_string();
            tracing::info!("CLI override: run url set to {}", url);
        }

        if let Some(runs) = runs {
            self.run.runs = runs;
            tracing::info!("CLI override: runs set to {}", runs);
        }
    }

    /// Enabled categories as a set
    pub fn categories(&self) -> CategorySet {
        self.opentsdb.data.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.opentsdb.host.is_none());
        assert_eq!(config.opentsdb.port, 4242);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[opentsdb]
host = "tsdb.internal"
port = 4343
namespace = "perf"
data = ["rules", "summary"]

[run]
url = "https://www.example.com/start"
runs = 5
"#
        )
        .unwrap();

        let config = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(config.opentsdb.host.as_deref(), Some("tsdb.internal"));
        assert_eq!(config.opentsdb.port, 4343);
        assert_eq!(config.opentsdb.data, vec![ExportCategory::Rules, ExportCategory::Summary]);
        assert_eq!(config.run.runs, 5);
        assert_eq!(config.hostname().unwrap(), "www.example.com");
        // Unspecified sections fall back to defaults
        assert_eq!(config.logging.level, "info");
        assert!(config.run.browsers.contains(&"chrome".to_string()));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::load_from_file(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.opentsdb.namespace, "sitespeed.io");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.opentsdb.namespace = "has space".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.opentsdb.host = Some("tsdb".to_string());
        config.opentsdb.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.run.runs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.run.url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.opentsdb.data.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_with_cli_args() {
        let mut config = Config::default();
        config.merge_with_cli_args(
            Some("10.0.0.5"),
            Some(5000),
            Some("ci"),
            Some("timings,requests"),
            Some("http://shop.example.org/"),
            Some(7),
        );

        assert_eq!(config.opentsdb.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.opentsdb.port, 5000);
        assert_eq!(config.opentsdb.namespace, "ci");
        assert!(config.categories().is_enabled(ExportCategory::Requests));
        assert!(!config.categories().is_enabled(ExportCategory::Rules));
        assert_eq!(config.run.runs, 7);

        let export = config.export_config().unwrap();
        assert_eq!(export.hostname, "shop.example.org");
        assert_eq!(export.runs, 7);
    }

    #[test]
    fn test_invalid_cli_data_is_ignored() {
        let mut config = Config::default();
        config.merge_with_cli_args(None, None, None, Some("everything"), None, None);
        assert_eq!(config.opentsdb.data, vec![ExportCategory::All]);
    }
}
