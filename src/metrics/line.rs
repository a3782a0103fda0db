//! Metric Line
//!
//! One OpenTSDB telnet-style data point:
//! `<namespace> <unix-seconds> <value> <tag>=<val> <tag>=<val> ...`

use std::fmt;

use anyhow::{anyhow, bail, Context};

use crate::Result;

/// A single data point with its tags in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub namespace: String,
    pub timestamp: i64,
    pub value: f64,
    pub tags: Vec<(String, String)>,
}

impl MetricLine {
    pub fn new(namespace: impl Into<String>, timestamp: i64, value: f64) -> Self {
        Self {
            namespace: namespace.into(),
            timestamp,
            value,
            tags: Vec::new(),
        }
    }

    /// Append a tag. Whitespace and control characters in the value are
    /// replaced with `_` so the line stays splittable.
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.push((key.to_string(), sanitize_tag_value(value)));
        self
    }

    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a rendered line back into its parts
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();

        let namespace = parts
            .next()
            .ok_or_else(|| anyhow!("Empty metric line"))?
            .to_string();
        let timestamp = parts
            .next()
            .ok_or_else(|| anyhow!("Missing timestamp in line: {}", line))?
            .parse::<i64>()
            .with_context(|| format!("Invalid timestamp in line: {}", line))?;
        let value = parts
            .next()
            .ok_or_else(|| anyhow!("Missing value in line: {}", line))?
            .parse::<f64>()
            .with_context(|| format!("Invalid value in line: {}", line))?;

        let mut tags = Vec::new();
        for tag in parts {
            match tag.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    tags.push((key.to_string(), value.to_string()));
                }
                _ => bail!("Malformed tag '{}' in line: {}", tag, line),
            }
        }

        Ok(Self {
            namespace,
            timestamp,
            value,
            tags,
        })
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.namespace, self.timestamp, self.value)?;
        for (key, value) in &self.tags {
            write!(f, " {}={}", key, value)?;
        }
        writeln!(f)
    }
}

/// Replace anything [`MetricLine::parse`] would split on, or that would end
/// the line early, with `_`
pub fn sanitize_tag_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let line = MetricLine::new("test.rules", 1400000000, 5.0)
            .tag("rule", "ycdn")
            .tag("url", "http//example.com/");

        assert_eq!(
            line.to_string(),
            "test.rules 1400000000 5 rule=ycdn url=http//example.com/\n"
        );
    }

    #[test]
    fn test_render_fractional_value() {
        let line = MetricLine::new("test.score", 1, 12.5);
        assert_eq!(line.to_string(), "test.score 1 12.5\n");
    }

    #[test]
    fn test_tag_whitespace_replaced() {
        let line = MetricLine::new("test", 1, 1.0).tag("timing", "first paint\tdone");
        assert_eq!(line.get_tag("timing"), Some("first_paint_done"));
    }

    #[test]
    fn test_tag_unicode_whitespace_and_controls_replaced() {
        let line = MetricLine::new("test", 1, 1.0).tag("url", "a\u{a0}b\u{2003}c\u{b}d\u{0}e");
        assert_eq!(line.get_tag("url"), Some("a_b_c_d_e"));

        let parsed = MetricLine::parse(&line.to_string()).unwrap();
        assert_eq!(parsed, line);
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let line =
            MetricLine::parse("test.requests.timing 10 3 assetUrl=http//a.com/?x=1 url=b").unwrap();
        assert_eq!(line.namespace, "test.requests.timing");
        assert_eq!(line.timestamp, 10);
        assert_eq!(line.value, 3.0);
        assert_eq!(line.get_tag("assetUrl"), Some("http//a.com/?x=1"));
        assert_eq!(line.get_tag("url"), Some("b"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(MetricLine::parse("").is_err());
        assert!(MetricLine::parse("test 10").is_err());
        assert!(MetricLine::parse("test ten 1").is_err());
        assert!(MetricLine::parse("test 10 1 notatag").is_err());
    }
}
