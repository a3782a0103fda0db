//! Configuration Types

use std::collections::HashSet;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::metrics::{CategorySet, ExportCategory};
use crate::Result;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub opentsdb: OpenTsdbConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenTSDB target and export selection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenTsdbConfig {
    /// No host means the export task does nothing
    pub host: Option<String>,
    pub port: u16,
    pub namespace: String,
    pub data: Vec<ExportCategory>,
}

/// Details of the test run being exported
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// The tested start URL; its hostname becomes the `host` tag
    pub url: String,
    /// Runs per browser
    pub runs: u32,
    /// Browser identifiers that may appear as keys inside page timings
    pub browsers: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for OpenTsdbConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 4242,
            namespace: "sitespeed.io".to_string(),
            data: vec![ExportCategory::All],
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_string(),
            runs: 3,
            browsers: ["chrome", "firefox", "headless", "ie", "safari"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Hostname of the tested URL
    pub fn hostname(&self) -> Result<String> {
        let url = url::Url::parse(&self.run.url)
            .with_context(|| format!("Invalid run url: {}", self.run.url))?;
        url.host_str()
            .map(|h| h.to_string())
            .ok_or_else(|| anyhow!("Run url has no host: {}", self.run.url))
    }

    /// Build the formatter settings for this configuration
    pub fn export_config(&self) -> Result<ExportConfig> {
        Ok(ExportConfig {
            namespace: self.opentsdb.namespace.clone(),
            categories: self.categories(),
            browsers: self.run.browsers.iter().cloned().collect(),
            runs: self.run.runs,
            hostname: self.hostname()?,
        })
    }
}

/// Everything the formatter needs to know about an export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub namespace: String,
    pub categories: CategorySet,
    pub browsers: HashSet<String>,
    pub runs: u32,
    pub hostname: String,
}

impl ExportConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            categories: CategorySet::all(),
            browsers: RunConfig::default().browsers.into_iter().collect(),
            runs: RunConfig::default().runs,
            hostname: "localhost".to_string(),
        }
    }

    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = ExportCategory>,
    {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_browsers<I, S>(mut self, browsers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.browsers = browsers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn is_browser(&self, key: &str) -> bool {
        self.browsers.contains(key)
    }
}
