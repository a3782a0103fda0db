//! Metrics Module
//! 
//! Flattens test results into OpenTSDB metric lines.

pub mod category;
pub mod collector;
pub mod content_type;
pub mod line;

pub use category::{CategorySet, ExportCategory};
pub use collector::{decode_url_key, MetricFormatter};
pub use line::MetricLine;
