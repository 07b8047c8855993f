//! Reduction of metric series to a single value
//!
//! A reduction of an empty series is `None` ("no data"), never `0.0`. Callers
//! decide what no data means for their rule: compute and database idle checks
//! treat it as unknown, the low-I/O volume rule treats it as zero activity.

use crate::provider::Sample;
use serde::{Deserialize, Serialize};

/// How to reduce a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reduction {
    /// Arithmetic mean of the sample values (not time-weighted)
    Average,
    /// Total of the sample values
    Sum,
}

/// Reduce raw values. Returns `None` for an empty input.
pub fn reduce(values: &[f64], mode: Reduction) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    match mode {
        Reduction::Sum => Some(total),
        Reduction::Average => Some(total / values.len() as f64),
    }
}

/// Reduce a series of samples. Returns `None` for an empty series.
pub fn reduce_samples(samples: &[Sample], mode: Reduction) -> Option<f64> {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    reduce(&values, mode)
}

/// Value of the newest sample, for daily gauges such as bucket size.
pub fn latest(samples: &[Sample]) -> Option<f64> {
    samples
        .iter()
        .max_by_key(|s| s.timestamp)
        .map(|s| s.value)
}
