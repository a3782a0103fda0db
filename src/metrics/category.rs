//! Export Categories

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Groups of metrics that can be switched on and off independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportCategory {
    Rules,
    Timings,
    PageMetrics,
    Summary,
    Requests,
    All,
}

impl ExportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Timings => "timings",
            Self::PageMetrics => "pagemetrics",
            Self::Summary => "summary",
            Self::Requests => "requests",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ExportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "timings" => Ok(Self::Timings),
            "pagemetrics" => Ok(Self::PageMetrics),
            "summary" => Ok(Self::Summary),
            "requests" => Ok(Self::Requests),
            "all" => Ok(Self::All),
            other => bail!(
                "Unknown export category '{}', expected one of: \
                 rules, timings, pagemetrics, summary, requests, all",
                other
            ),
        }
    }
}

/// The set of enabled categories.
///
/// `All` enables every category except `Requests`, which has to be named
/// explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    categories: HashSet<ExportCategory>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        [ExportCategory::All].into_iter().collect()
    }

    pub fn is_enabled(&self, category: ExportCategory) -> bool {
        if self.categories.contains(&category) {
            return true;
        }
        category != ExportCategory::Requests && self.categories.contains(&ExportCategory::All)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<ExportCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = ExportCategory>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a ExportCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = &'a ExportCategory>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}
