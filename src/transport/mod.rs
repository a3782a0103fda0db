//! Transport Module
//!
//! Ships formatted metric lines to OpenTSDB.

pub mod sender;

pub use sender::{MetricSender, SendOutcome, BATCH_TERMINATOR};
