//! opentsdb-export - ship web-performance test results to OpenTSDB

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opentsdb_export::{
    config::ConfigManager,
    export::{format_results, run_export, ExportOutcome},
    MetricLine, TestResults,
};

/// CLI arguments for opentsdb-export
#[derive(Parser, Debug)]
#[command(name = "opentsdb-export")]
#[command(about = "Send web-performance test results to OpenTSDB")]
#[command(version)]
#[command(long_about = "
Send web-performance test results to OpenTSDB

Reads a results JSON file ({\"aggregates\": [...], \"pages\": [...], \"domains\": [...]}),
flattens it into OpenTSDB lines and writes them to the configured host over TCP.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  OPENTSDB_HOST       - OpenTSDB host; without a host nothing is sent
  OPENTSDB_PORT       - OpenTSDB telnet port (default 4242)
  OPENTSDB_NAMESPACE  - Metric namespace prefix
  OPENTSDB_DATA       - Categories: rules,timings,pagemetrics,summary,requests,all
  OPENTSDB_RUN_URL    - Tested URL, its hostname becomes the host tag
  OPENTSDB_RUNS       - Runs per browser
  OPENTSDB_LOG_LEVEL  - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "opentsdb.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Results file produced by the test run
    #[arg(short, long, help = "Path to the results JSON file")]
    pub results: Option<PathBuf>,

    /// OpenTSDB host (overrides config file)
    #[arg(long, help = "OpenTSDB host")]
    pub host: Option<String>,

    /// OpenTSDB port (overrides config file)
    #[arg(short, long, help = "OpenTSDB port")]
    pub port: Option<u16>,

    /// Metric namespace (overrides config file)
    #[arg(short, long, help = "Metric namespace prefix")]
    pub namespace: Option<String>,

    /// Categories to export (overrides config file)
    #[arg(short, long, help = "Comma separated categories to export")]
    pub data: Option<String>,

    /// Tested URL (overrides config file)
    #[arg(short, long, help = "Tested URL")]
    pub url: Option<String>,

    /// Runs per browser (overrides config file)
    #[arg(long, help = "Runs per browser")]
    pub runs: Option<u32>,

    /// Log level (trace, debug, info, warn, error), overrides config file
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Print the metric lines instead of sending them
    #[arg(long, help = "Print metric lines and exit")]
    pub dry_run: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > config file > environment > defaults.
    // The subscriber depends on the configured level, so loading happens first.
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    init_tracing(&args, &config.logging.level)?;

    info!("Starting opentsdb-export v{}", env!("CARGO_PKG_VERSION"));

    config.merge_with_cli_args(
        args.host.as_deref(),
        args.port,
        args.namespace.as_deref(),
        args.data.as_deref(),
        args.url.as_deref(),
        args.runs,
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!(
            "  OpenTSDB: {}",
            match &config.opentsdb.host {
                Some(host) => format!("{}:{}", host, config.opentsdb.port),
                None => "not configured".to_string(),
            }
        );
        info!("  Namespace: {}", config.opentsdb.namespace);
        info!(
            "  Data: {}",
            config
                .opentsdb
                .data
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        info!("  Host tag: {}", config.hostname()?);
        info!("  Runs per browser: {}", config.run.runs);
        return Ok(());
    }

    let results_path = args
        .results
        .as_deref()
        .context("--results is required unless --validate-config is given")?;
    let results = TestResults::load_from_file(results_path)?;

    if args.dry_run {
        let payload = format_results(&config, &results)?;
        for line in payload.lines() {
            if let Err(e) = MetricLine::parse(line) {
                warn!("Unparseable line produced: {}", e);
            }
        }
        print!("{}", payload);
        info!("Dry run: {} lines", payload.lines().count());
        return Ok(());
    }

    match run_export(&config, &results).await? {
        ExportOutcome::Skipped => {
            warn!("No OpenTSDB host configured, nothing sent");
        }
        ExportOutcome::Sent(outcome) if outcome.is_delivered() => {
            info!("Metrics delivered to OpenTSDB");
        }
        ExportOutcome::Sent(_) => {
            error!("Metrics could not be delivered to OpenTSDB");
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs, configured_level: &str) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_deref().unwrap_or(configured_level)
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    Ok(())
}
