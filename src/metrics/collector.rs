//! Metrics Collector
//!
//! Flattens test results into OpenTSDB lines. Every leaf value becomes one
//! line; absent or empty data simply produces no lines.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use super::content_type::content_type;
use super::line::sanitize_tag_value;
use super::{ExportCategory, MetricLine};
use crate::config::ExportConfig;
use crate::results::{
    AggregateResult, DomainResult, HarEntry, PageResult, Statistic, Statistics, TimingCategory,
    TimingGroup, TimingPhase,
};

/// Statistics pushed for page timings
const TIMING_STATS: [Statistic; 4] = [
    Statistic::Min,
    Statistic::Median,
    Statistic::P90,
    Statistic::Max,
];

/// Statistics pushed per domain timing phase
const DOMAIN_STATS: [Statistic; 3] = [Statistic::Min, Statistic::Median, Statistic::Max];

/// Statistics pushed per aggregate
const SUMMARY_STATS: [Statistic; 7] = [
    Statistic::Min,
    Statistic::P10,
    Statistic::Median,
    Statistic::Mean,
    Statistic::P90,
    Statistic::P99,
    Statistic::Max,
];

/// Turns one run's results into metric lines.
///
/// The run timestamp is captured once on construction and stamped on every
/// line, except per-request lines which carry the request's own start time.
pub struct MetricFormatter {
    config: ExportConfig,
    timestamp: i64,
}

impl MetricFormatter {
    /// Create a formatter stamped with the current time
    pub fn new(config: ExportConfig) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_millis() as f64 / 1000.0).round() as i64)
            .unwrap_or_default();
        Self::with_timestamp(config, timestamp)
    }

    /// Create a formatter with a fixed run timestamp
    pub fn with_timestamp(config: ExportConfig, timestamp: i64) -> Self {
        Self { config, timestamp }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Render all enabled categories as one newline-terminated blob
    pub fn format(
        &self,
        aggregates: &[AggregateResult],
        pages: &[PageResult],
        domains: &[DomainResult],
    ) -> String {
        self.collect(aggregates, pages, domains)
            .iter()
            .map(MetricLine::to_string)
            .collect()
    }

    /// Collect all enabled categories as structured lines.
    ///
    /// Order: per page (rules, timings, page metrics, requests), then the
    /// summary, then the domains.
    pub fn collect(
        &self,
        aggregates: &[AggregateResult],
        pages: &[PageResult],
        domains: &[DomainResult],
    ) -> Vec<MetricLine> {
        let mut lines = Vec::new();

        for page in pages {
            self.collect_page(page, &mut lines);
        }

        if self.enabled(ExportCategory::Summary) {
            self.collect_summary(aggregates, pages.len(), &mut lines);
            self.collect_domains(domains, &mut lines);
        }

        debug!(
            lines = lines.len(),
            pages = pages.len(),
            domains = domains.len(),
            aggregates = aggregates.len(),
            "Collected OpenTSDB metrics"
        );
        lines
    }

    fn collect_page(&self, page: &PageResult, lines: &mut Vec<MetricLine>) {
        let url_key = decode_url_key(&page.url);

        self.collect_rules(page, &url_key, lines);
        self.collect_timings(page, &url_key, lines);
        self.collect_page_metrics(page, &url_key, lines);
        self.collect_requests(page, &url_key, lines);
    }

    fn collect_rules(&self, page: &PageResult, url_key: &str, lines: &mut Vec<MetricLine>) {
        if !self.enabled(ExportCategory::Rules) || !page.has_rule_evaluation() {
            return;
        }

        for (rule, score) in &page.rules {
            lines.push(
                self.metric("rules", score.v)
                    .tag("rule", rule)
                    .tag("url", url_key),
            );
        }
    }

    fn collect_timings(&self, page: &PageResult, url_key: &str, lines: &mut Vec<MetricLine>) {
        if !self.enabled(ExportCategory::Timings) {
            return;
        }

        for category in TimingCategory::ALL {
            let Some(groups) = page.timing_category(category) else {
                continue;
            };

            // generic timings first, then everything measured per browser
            for (timing, group) in groups {
                if self.config.is_browser(timing) {
                    continue;
                }
                if let TimingGroup::Stats(stats) = group {
                    for stat in TIMING_STATS {
                        if let Some(value) = stats.get(stat.as_str()) {
                            lines.push(
                                self.metric(category.as_str(), value.v)
                                    .tag("timing", timing)
                                    .tag("type", stat.as_str())
                                    .tag("url", url_key),
                            );
                        }
                    }
                }
            }

            for (browser, group) in groups {
                if !self.config.is_browser(browser) {
                    continue;
                }
                if let TimingGroup::PerBrowser(per_timing) = group {
                    for (timing, stats) in per_timing {
                        for stat in TIMING_STATS {
                            if let Some(value) = stats.get(stat.as_str()) {
                                lines.push(
                                    self.metric(category.as_str(), value.v)
                                        .tag("timing", timing)
                                        .tag("browser", browser)
                                        .tag("type", stat.as_str())
                                        .tag("url", url_key),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect_page_metrics(&self, page: &PageResult, url_key: &str, lines: &mut Vec<MetricLine>) {
        if !self.enabled(ExportCategory::PageMetrics) {
            return;
        }
        let Some(yslow) = &page.yslow else {
            return;
        };

        for (asset, weight) in &yslow.assets {
            lines.push(
                self.metric("assets", weight.v)
                    .tag("asset", asset)
                    .tag("url", url_key),
            );
        }

        let page_values = [
            ("score", page.score),
            ("noRequests", yslow.requests.map(|m| m.v)),
            ("requestsMissingExpire", yslow.requests_missing_expire.map(|m| m.v)),
            ("timeSinceLastModification", yslow.time_since_last_modification.map(|m| m.v)),
            ("cacheTime", yslow.cache_time.map(|m| m.v)),
            ("pageWeight", yslow.page_weight.map(|m| m.v)),
        ];
        for (name, value) in page_values {
            if let Some(value) = value {
                lines.push(self.metric(name, value).tag("url", url_key));
            }
        }
    }

    fn collect_requests(&self, page: &PageResult, url_key: &str, lines: &mut Vec<MetricLine>) {
        if !self.enabled(ExportCategory::Requests) {
            return;
        }

        for har in &page.har {
            for entry in &har.log.entries {
                self.collect_request(entry, url_key, lines);
            }
        }
    }

    fn collect_request(&self, entry: &HarEntry, url_key: &str, lines: &mut Vec<MetricLine>) {
        let asset_url = decode_url_key(&entry.request.url);

        if let Some(timings) = &entry.timings {
            let started = entry.started_at().unwrap_or_else(|| {
                debug!(
                    started = %entry.started_date_time,
                    "Unparseable request start time, using run timestamp"
                );
                self.timestamp
            });

            for phase in TimingPhase::REQUEST {
                let namespace = self.namespaced("requests.timing");
                lines.push(
                    MetricLine::new(namespace, started, timings.phase(phase))
                        .tag("assetUrl", &asset_url)
                        .tag("timing", phase.as_str())
                        .tag("url", url_key),
                );
            }

            lines.push(
                MetricLine::new(
                    self.namespaced("requests.timing.total"),
                    started,
                    timings.phase(TimingPhase::Total),
                )
                .tag("assetUrl", &asset_url)
                .tag("url", url_key),
            );
        }

        // sizes use the run timestamp so a run reports each asset once
        let content = &entry.response.content;
        lines.push(
            self.metric(
                &format!("requests.type.{}.size", content_type(&content.mime_type)),
                content.size,
            )
            .tag("assetUrl", &asset_url)
            .tag("url", url_key),
        );
    }

    fn collect_summary(
        &self,
        aggregates: &[AggregateResult],
        page_count: usize,
        lines: &mut Vec<MetricLine>,
    ) {
        let hostname = &self.config.hostname;

        for aggregate in aggregates {
            let kind = sanitize_tag_value(&aggregate.kind);
            if kind != aggregate.kind {
                warn!(
                    kind = %aggregate.kind.escape_debug(),
                    sanitized = %kind,
                    "Aggregate type is not a valid metric name segment"
                );
            }
            let suffix = format!("summary.{}", kind);
            let metric = aggregate.metric_name();

            for stat in SUMMARY_STATS {
                if let Some(value) = aggregate.stats.get(stat) {
                    lines.push(
                        self.metric(&suffix, value)
                            .tag("host", hostname)
                            .tag("metric", &metric)
                            .tag("type", stat.as_str()),
                    );
                }
            }
        }

        lines.push(
            self.metric("summary.runsPerBrowser", self.config.runs as f64)
                .tag("host", hostname),
        );
        lines.push(self.metric("summary.testPages", page_count as f64).tag("host", hostname));
    }

    fn collect_domains(&self, domains: &[DomainResult], lines: &mut Vec<MetricLine>) {
        let hostname = &self.config.hostname;

        for domain in domains {
            for phase in TimingPhase::ALL {
                let Some(stats) = domain
                    .phase(phase)
                    .and_then(|samples| Statistics::from_samples(&samples.stats))
                else {
                    continue;
                };

                for stat in DOMAIN_STATS {
                    lines.push(
                        self.metric("summary.domain.timing", stats.get(stat))
                            .tag("domain", &domain.domain)
                            .tag("host", hostname)
                            .tag("type", phase.as_str())
                            .tag("subtype", stat.as_str()),
                    );
                }
            }

            if let Some(accumulated) = domain.accumulated_time {
                lines.push(
                    self.metric("summary.domain.accumulatedTime", accumulated)
                        .tag("domain", &domain.domain)
                        .tag("host", hostname),
                );
            }

            if let Some(count) = domain.count {
                lines.push(
                    self.metric("summary.domain.requests", count as f64)
                        .tag("domain", &domain.domain)
                        .tag("host", hostname),
                );
            }

            if let Some(sizes) = &domain.size {
                for (kind, size) in sizes {
                    lines.push(
                        self.metric("summary.domain.size", *size)
                            .tag("domain", &domain.domain)
                            .tag("host", hostname)
                            .tag("type", kind),
                    );
                }
            }
        }
    }

    fn enabled(&self, category: ExportCategory) -> bool {
        self.config.categories.is_enabled(category)
    }

    fn namespaced(&self, suffix: &str) -> String {
        if self.config.namespace.is_empty() {
            suffix.to_string()
        } else {
            format!("{}.{}", self.config.namespace, suffix)
        }
    }

    fn metric(&self, suffix: &str, value: f64) -> MetricLine {
        MetricLine::new(self.namespaced(suffix), self.timestamp, value)
    }
}

/// Percent-decoded URL with colons stripped, for use as a tag value.
///
/// Falls back to the raw URL when it does not decode to valid UTF-8. Every
/// colon is removed, not only the scheme's, so `host:port` URLs collapse to
/// `hostport` rather than keeping the port separator.
pub fn decode_url_key(url: &str) -> String {
    let decoded = match urlencoding::decode(url) {
        Ok(decoded) => decoded,
        Err(e) => {
            info!("Couldn't decode URI: {} ({})", url, e);
            Cow::Borrowed(url)
        }
    };
    decoded.replace(':', "")
}
