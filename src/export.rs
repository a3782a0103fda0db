//! Export Task
//!
//! Glue between the test pipeline and OpenTSDB: does nothing unless a host
//! is configured, otherwise formats the results and sends them once.

use tracing::{debug, info};

use crate::config::Config;
use crate::metrics::MetricFormatter;
use crate::results::TestResults;
use crate::transport::{MetricSender, SendOutcome};
use crate::Result;

/// How an export run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No OpenTSDB host configured
    Skipped,
    Sent(SendOutcome),
}

/// Format the results according to `config` without sending them
pub fn format_results(config: &Config, results: &TestResults) -> Result<String> {
    let formatter = MetricFormatter::new(config.export_config()?);
    Ok(formatter.format(&results.aggregates, &results.pages, &results.domains))
}

/// Format and send the results to the configured OpenTSDB host
pub async fn run_export(config: &Config, results: &TestResults) -> Result<ExportOutcome> {
    let Some(host) = config.opentsdb.host.as_deref() else {
        debug!("No OpenTSDB host configured, skipping export");
        return Ok(ExportOutcome::Skipped);
    };

    let payload = format_results(config, results)?;
    let sender = MetricSender::new(host, config.opentsdb.port);
    let outcome = sender.send(&payload).await;

    info!(
        host = %host,
        port = config.opentsdb.port,
        delivered = outcome.is_delivered(),
        "OpenTSDB export finished"
    );
    Ok(ExportOutcome::Sent(outcome))
}
