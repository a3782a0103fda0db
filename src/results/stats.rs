//! Sample Statistics

/// Named statistics reported for timings and aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Min,
    P10,
    Median,
    Mean,
    P90,
    P99,
    Max,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::P10 => "p10",
            Self::Median => "median",
            Self::Mean => "mean",
            Self::P90 => "p90",
            Self::P99 => "p99",
            Self::Max => "max",
        }
    }
}

/// Summary statistics over a set of raw samples, rounded to whole numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    min: f64,
    p10: f64,
    median: f64,
    mean: f64,
    p90: f64,
    p99: f64,
    max: f64,
}

impl Statistics {
    /// Returns `None` when there is nothing to summarize.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|s| !s.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(Self {
            min: sorted[0].round(),
            p10: percentile(&sorted, 10.0).round(),
            median: percentile(&sorted, 50.0).round(),
            mean: mean.round(),
            p90: percentile(&sorted, 90.0).round(),
            p99: percentile(&sorted, 99.0).round(),
            max: sorted[sorted.len() - 1].round(),
        })
    }

    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Min => self.min,
            Statistic::P10 => self.p10,
            Statistic::Median => self.median,
            Statistic::Mean => self.mean,
            Statistic::P90 => self.p90,
            Statistic::P99 => self.p99,
            Statistic::Max => self.max,
        }
    }
}

// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (sorted.len() - 1) as f64 * p / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}
