use std::hint::black_box;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::extract::PytestStats;
use crate::schema::BenchMeasurement;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BenchConfig {
    pub profile: Profile,
}

impl BenchConfig {
    pub fn warmup_rounds(&self) -> u64 {
        match self.profile {
            Profile::Quick => 3,
            Profile::Full => 10,
        }
    }

    pub fn rounds(&self) -> u64 {
        match self.profile {
            Profile::Quick => 30,
            Profile::Full => 300,
        }
    }

    pub fn measure<T>(&self, name: &str, f: impl FnMut() -> T) -> BenchMeasurement {
        let measured = measure_fn(self.rounds(), self.warmup_rounds(), f);
        debug!(
            name,
            profile = self.profile.as_str(),
            rounds = measured.rounds,
            total_ns = measured.total_ns as u64,
            "measured benchmark"
        );
        measured.to_measurement(name)
    }
}

#[derive(Clone, Debug)]
pub struct Measured {
    pub rounds: u64,
    pub warmup_rounds: u64,
    pub total_ns: u128,
    pub mean_s: f64,
    pub stddev_s: f64,
}

impl Measured {
    pub fn stats(&self) -> PytestStats {
        PytestStats {
            mean: self.mean_s,
            stddev: self.stddev_s,
            rounds: self.rounds,
            ops: if self.mean_s > 0.0 { 1.0 / self.mean_s } else { 0.0 },
        }
    }

    /// Same text layout as a pytest-benchmark result.
    pub fn to_measurement(&self, name: &str) -> BenchMeasurement {
        self.stats().to_measurement(name)
    }
}

/// Times each of `rounds` calls separately after `warmup_rounds` untimed ones.
pub fn measure_fn<T>(rounds: u64, warmup_rounds: u64, mut f: impl FnMut() -> T) -> Measured {
    for _ in 0..warmup_rounds {
        black_box(f());
    }

    let rounds = rounds.max(1);
    let mut samples = Vec::with_capacity(rounds as usize);
    for _ in 0..rounds {
        let start = Instant::now();
        black_box(f());
        samples.push(start.elapsed());
    }

    let total_ns: u128 = samples.iter().map(|d| d.as_nanos()).sum();
    let secs: Vec<f64> = samples.iter().map(|d| d.as_secs_f64()).collect();
    let (mean_s, stddev_s) = mean_stddev(&secs);

    Measured {
        rounds,
        warmup_rounds,
        total_ns,
        mean_s,
        stddev_s,
    }
}

/// Sample standard deviation (n - 1); zero for a single sample.
fn mean_stddev(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if samples.len() < 2 {
        return (mean, 0.0);
    }
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Milliseconds since the epoch, the unit of `date` and `lastUpdate`.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
