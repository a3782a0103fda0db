//! OpenTSDB Export Library
//!
//! Turns web-performance test results (per-page timings, aggregate summaries
//! and per-domain breakdowns) into OpenTSDB telnet-style metric lines and
//! ships them to a time-series database over a plain TCP connection.

pub mod config;
pub mod export;
pub mod metrics;
pub mod results;
pub mod transport;

pub use config::{Config, ExportConfig};
pub use export::{run_export, ExportOutcome};
pub use metrics::{MetricFormatter, MetricLine};
pub use results::TestResults;
pub use transport::{MetricSender, SendOutcome};

/// Common error type for the exporter
pub type Result<T> = anyhow::Result<T>;
