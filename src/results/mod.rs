//! Test Results Module
//!
//! Read-only input model produced by the test-execution pipeline: per-page
//! results, per-domain breakdowns and aggregate summaries.

pub mod har;
pub mod stats;
pub mod types;

pub use har::{Har, HarEntry, HarTimings};
pub use stats::{Statistic, Statistics};
pub use types::*;
