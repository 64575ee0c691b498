//! Conversion of pytest-benchmark output into ledger measurements.
//!
//! The text written to `range` and `extra` mirrors what the dashboard has
//! always shown for pytest runs:
//!
//! ```text
//! range: "stddev: 0.021680743871788484"
//! extra: "mean: 194.9337275999966 msec\nrounds: 30"
//! ```

use serde::Deserialize;

use crate::schema::{BenchMeasurement, Commit, CommitBenchmarkEntry};

pub const PYTEST_TOOL: &str = "pytest";
pub const ITER_PER_SEC: &str = "iter/sec";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid pytest-benchmark output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pytest-benchmark output contains no benchmarks")]
    NoBenchmarks,
}

/// The subset of pytest-benchmark statistics the ledger records. Times are
/// in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PytestStats {
    pub mean: f64,
    pub stddev: f64,
    pub rounds: u64,
    pub ops: f64,
}

impl PytestStats {
    pub fn to_measurement(&self, name: impl Into<String>) -> BenchMeasurement {
        let (mean, mean_unit) = human_duration(self.mean);
        let mut m = BenchMeasurement::new(name, self.ops, ITER_PER_SEC);
        m.range = Some(format!("stddev: {}", js_number(self.stddev)));
        m.extra = Some(format!(
            "mean: {} {mean_unit}\nrounds: {}",
            js_number(mean),
            self.rounds
        ));
        m
    }
}

#[derive(Deserialize)]
struct PytestOutput {
    benchmarks: Vec<PytestBenchmark>,
}

#[derive(Deserialize)]
struct PytestBenchmark {
    fullname: String,
    stats: PytestStats,
}

/// Parses the JSON written by `pytest --benchmark-json`.
pub fn parse_pytest(json: &str) -> Result<Vec<BenchMeasurement>, ExtractError> {
    let output: PytestOutput = serde_json::from_str(json)?;
    if output.benchmarks.is_empty() {
        return Err(ExtractError::NoBenchmarks);
    }
    Ok(output
        .benchmarks
        .into_iter()
        .map(|b| b.stats.to_measurement(b.fullname))
        .collect())
}

pub fn pytest_entry(
    commit: Commit,
    date: u64,
    json: &str,
) -> Result<CommitBenchmarkEntry, ExtractError> {
    Ok(CommitBenchmarkEntry::new(commit, date, PYTEST_TOOL, parse_pytest(json)?))
}

/// Scales a duration in seconds to the largest unit keeping it at least 1.
pub fn human_duration(seconds: f64) -> (f64, &'static str) {
    if seconds < 1.0e-6 {
        (seconds * 1.0e9, "nsec")
    } else if seconds < 1.0e-3 {
        (seconds * 1.0e6, "usec")
    } else if seconds < 1.0 {
        (seconds * 1.0e3, "msec")
    } else {
        (seconds, "sec")
    }
}

/// Shortest round-trip rendering, switching to exponent notation at the same
/// thresholds the dashboard's number printing does.
pub fn js_number(v: f64) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "NaN".into()
        } else if v > 0.0 {
            "Infinity".into()
        } else {
            "-Infinity".into()
        };
    }
    let abs = v.abs();
    if abs != 0.0 && !(1.0e-6..1.0e21).contains(&abs) {
        let s = format!("{v:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    if v == 0.0 {
        return "0".into();
    }
    format!("{v}")
}
