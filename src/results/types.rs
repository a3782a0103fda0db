//! Result Types

use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::har::Har;
use super::stats::Statistic;
use crate::Result;

/// A single measured value, serialized upstream as `{"v": <number>}`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Measurement {
    pub v: f64,
}

impl From<f64> for Measurement {
    fn from(v: f64) -> Self {
        Self { v }
    }
}

/// Statistic name -> value, e.g. `{"min": {"v": 10}, "median": {"v": 12}}`
pub type StatMap = IndexMap<String, Measurement>;

/// One entry below a timing category of a page.
///
/// Generic timings map statistic names straight to values. Browser keys hold
/// one more level: timing name -> statistic name -> value. Which of the two a
/// key is supposed to be is decided by the configured browser list; the shape
/// only tells the formatter whether descending is possible.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimingGroup {
    Stats(StatMap),
    PerBrowser(IndexMap<String, StatMap>),
}

/// The three timing categories a page can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingCategory {
    Timings,
    Custom,
    Extras,
}

impl TimingCategory {
    pub const ALL: [TimingCategory; 3] = [Self::Timings, Self::Custom, Self::Extras];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timings => "timings",
            Self::Custom => "custom",
            Self::Extras => "extras",
        }
    }
}

/// Network timing phases tracked per domain and per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingPhase {
    Blocked,
    Dns,
    Connect,
    Ssl,
    Send,
    Wait,
    Receive,
    Total,
}

impl TimingPhase {
    pub const ALL: [TimingPhase; 8] = [
        Self::Blocked,
        Self::Dns,
        Self::Connect,
        Self::Ssl,
        Self::Send,
        Self::Wait,
        Self::Receive,
        Self::Total,
    ];

    /// Phases a single HAR request reports; `Total` is their sum
    pub const REQUEST: [TimingPhase; 7] = [
        Self::Blocked,
        Self::Dns,
        Self::Connect,
        Self::Ssl,
        Self::Send,
        Self::Wait,
        Self::Receive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Ssl => "ssl",
            Self::Send => "send",
            Self::Wait => "wait",
            Self::Receive => "receive",
            Self::Total => "total",
        }
    }
}

/// YSlow page metrics
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YslowMetrics {
    /// Page weight per asset type
    #[serde(default)]
    pub assets: IndexMap<String, Measurement>,
    pub requests: Option<Measurement>,
    pub requests_missing_expire: Option<Measurement>,
    pub time_since_last_modification: Option<Measurement>,
    pub cache_time: Option<Measurement>,
    pub page_weight: Option<Measurement>,
}

/// Per-URL test result
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub url: String,
    #[serde(default)]
    pub rules: IndexMap<String, Measurement>,
    pub yslow: Option<YslowMetrics>,
    pub score: Option<f64>,
    pub timings: Option<IndexMap<String, TimingGroup>>,
    pub custom: Option<IndexMap<String, TimingGroup>>,
    pub extras: Option<IndexMap<String, TimingGroup>>,
    #[serde(default)]
    pub har: Vec<Har>,
}

impl PageResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn timing_category(
        &self,
        category: TimingCategory,
    ) -> Option<&IndexMap<String, TimingGroup>> {
        match category {
            TimingCategory::Timings => self.timings.as_ref(),
            TimingCategory::Custom => self.custom.as_ref(),
            TimingCategory::Extras => self.extras.as_ref(),
        }
    }

    /// Whether the page went through rule evaluation
    pub fn has_rule_evaluation(&self) -> bool {
        self.yslow.is_some()
    }
}

/// Raw samples for one timing phase of a domain
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Samples {
    #[serde(default)]
    pub stats: Vec<f64>,
}

/// Per-domain breakdown
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResult {
    pub domain: String,
    pub blocked: Option<Samples>,
    pub dns: Option<Samples>,
    pub connect: Option<Samples>,
    pub ssl: Option<Samples>,
    pub send: Option<Samples>,
    pub wait: Option<Samples>,
    pub receive: Option<Samples>,
    pub total: Option<Samples>,
    pub accumulated_time: Option<f64>,
    pub count: Option<u64>,
    pub size: Option<IndexMap<String, f64>>,
}

impl DomainResult {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn phase(&self, phase: TimingPhase) -> Option<&Samples> {
        match phase {
            TimingPhase::Blocked => self.blocked.as_ref(),
            TimingPhase::Dns => self.dns.as_ref(),
            TimingPhase::Connect => self.connect.as_ref(),
            TimingPhase::Ssl => self.ssl.as_ref(),
            TimingPhase::Send => self.send.as_ref(),
            TimingPhase::Wait => self.wait.as_ref(),
            TimingPhase::Receive => self.receive.as_ref(),
            TimingPhase::Total => self.total.as_ref(),
        }
    }

    pub fn set_phase(&mut self, phase: TimingPhase, samples: Vec<f64>) {
        let slot = match phase {
            TimingPhase::Blocked => &mut self.blocked,
            TimingPhase::Dns => &mut self.dns,
            TimingPhase::Connect => &mut self.connect,
            TimingPhase::Ssl => &mut self.ssl,
            TimingPhase::Send => &mut self.send,
            TimingPhase::Wait => &mut self.wait,
            TimingPhase::Receive => &mut self.receive,
            TimingPhase::Total => &mut self.total,
        };
        *slot = Some(Samples { stats: samples });
    }
}

/// Precomputed percentiles for one aggregate
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AggregateStats {
    pub min: Option<f64>,
    pub p10: Option<f64>,
    pub median: Option<f64>,
    pub mean: Option<f64>,
    pub p90: Option<f64>,
    pub p99: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateStats {
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Min => self.min,
            Statistic::P10 => self.p10,
            Statistic::Median => self.median,
            Statistic::Mean => self.mean,
            Statistic::P90 => self.p90,
            Statistic::P99 => self.p99,
            Statistic::Max => self.max,
        }
    }
}

/// Aggregate summary of one tracked metric across all runs and pages
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AggregateResult {
    pub id: String,
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub stats: AggregateStats,
}

impl AggregateResult {
    /// Marker in an aggregate id identifying WebPageTest sourced values
    pub const WPT_MARKER: &'static str = "WPT";

    /// Metric tag value: WPT sourced aggregates are reported as `wpt.<key>`
    pub fn metric_name(&self) -> String {
        if self.id.contains(Self::WPT_MARKER) {
            format!("wpt.{}", self.key.as_deref().unwrap_or(&self.id))
        } else {
            self.id.clone()
        }
    }
}

/// Everything the exporter consumes from one test run
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TestResults {
    #[serde(default)]
    pub aggregates: Vec<AggregateResult>,
    #[serde(default)]
    pub pages: Vec<PageResult>,
    #[serde(default)]
    pub domains: Vec<DomainResult>,
}

impl TestResults {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse test results JSON")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        tracing::info!("Loading test results from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;

        let results = Self::from_json(&content)
            .with_context(|| format!("Invalid results file: {}", path.display()))?;

        tracing::debug!(
            pages = results.pages.len(),
            domains = results.domains.len(),
            aggregates = results.aggregates.len(),
            "Test results loaded"
        );
        Ok(results)
    }
}
