//! HAR Types
//!
//! The subset of the HTTP Archive format needed for per-request export.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::types::TimingPhase;

/// One HAR document
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Har {
    pub log: HarLog,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HarLog {
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

/// A single request/response pair
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    pub started_date_time: String,
    pub request: HarRequest,
    #[serde(default)]
    pub response: HarResponse,
    pub timings: Option<HarTimings>,
}

impl HarEntry {
    /// Request start as unix seconds, rounded to the nearest second
    pub fn started_at(&self) -> Option<i64> {
        DateTime::parse_from_rfc3339(&self.started_date_time)
            .ok()
            .map(|started| (started.timestamp_millis() as f64 / 1000.0).round() as i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HarRequest {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HarResponse {
    #[serde(default)]
    pub content: HarContent,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: f64,
}

fn not_applicable() -> f64 {
    -1.0
}

/// Request phase timings in milliseconds; `-1` means the phase does not apply
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct HarTimings {
    #[serde(default = "not_applicable")]
    pub blocked: f64,
    #[serde(default = "not_applicable")]
    pub dns: f64,
    #[serde(default = "not_applicable")]
    pub connect: f64,
    #[serde(default = "not_applicable")]
    pub ssl: f64,
    #[serde(default = "not_applicable")]
    pub send: f64,
    #[serde(default = "not_applicable")]
    pub wait: f64,
    #[serde(default = "not_applicable")]
    pub receive: f64,
}

impl HarTimings {
    /// Value of one phase; `Total` is the plain sum of the request phases.
    pub fn phase(&self, phase: TimingPhase) -> f64 {
        match phase {
            TimingPhase::Blocked => self.blocked,
            TimingPhase::Dns => self.dns,
            TimingPhase::Connect => self.connect,
            TimingPhase::Ssl => self.ssl,
            TimingPhase::Send => self.send,
            TimingPhase::Wait => self.wait,
            TimingPhase::Receive => self.receive,
            TimingPhase::Total => TimingPhase::REQUEST.iter().map(|p| self.phase(*p)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_started_at() {
        let mut entry = HarEntry {
            started_date_time: "2014-05-20T10:00:00.600+02:00".to_string(),
            ..Default::default()
        };
        assert_eq!(entry.started_at(), Some(1400572801));

        entry.started_date_time = "yesterday".to_string();
        assert_eq!(entry.started_at(), None);
    }

    #[test]
    fn test_total_sums_phases() {
        let timings: HarTimings = serde_json::from_value(json!({
            "send": 1, "wait": 20, "receive": 4
        }))
        .unwrap();

        assert_eq!(timings.phase(TimingPhase::Dns), -1.0);
        assert_eq!(timings.phase(TimingPhase::Total), 21.0);
    }
}
