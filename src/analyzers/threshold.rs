//! Baseline activity threshold: mean minus two standard deviations of normal
//! weekday traffic, after outlier removal.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use crate::analyzers::utility::{mean, percentile, sample_stddev};
use crate::error::MetricsError;
use crate::telemetry::TelemetryRecord;

/// Multiplier applied to the interquartile range when fencing outliers.
pub const OUTLIER_IQR_FACTOR: f64 = 2.5;

/// Number of standard deviations subtracted from the mean.
const STDDEV_MULTIPLIER: f64 = 2.0;

/// Derives the baseline threshold from the baseline window's daily counts.
///
/// Weekend records are dropped, counts are summed per calendar day, days
/// outside the interquartile fences are discarded, and the threshold is
/// `mean - 2 * stddev` of what remains.
///
/// # Errors
///
/// Returns [`MetricsError::ThresholdInvalid`] when fewer than two days remain
/// or the threshold is not strictly positive.
pub fn calculate_baseline_threshold(records: &[TelemetryRecord]) -> Result<f64, MetricsError> {
    let daily = daily_weekday_counts(records);
    let kept = remove_outliers(&daily);

    let avg = mean(&kept);
    let sd = sample_stddev(&kept, avg).ok_or_else(|| {
        MetricsError::ThresholdInvalid(format!(
            "{} usable baseline day(s), at least 2 are needed",
            kept.len()
        ))
    })?;

    let threshold = avg - STDDEV_MULTIPLIER * sd;
    debug!(
        days = daily.len(),
        kept = kept.len(),
        mean = avg,
        stddev = sd,
        threshold,
        "Baseline threshold computed"
    );

    validate_threshold(threshold)
}

/// Accepts only strictly positive, finite thresholds.
pub fn validate_threshold(threshold: f64) -> Result<f64, MetricsError> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(threshold)
    } else {
        Err(MetricsError::ThresholdInvalid(format!(
            "threshold {threshold} is not a positive value"
        )))
    }
}

/// Sums counts per calendar day, skipping Saturdays and Sundays.
fn daily_weekday_counts(records: &[TelemetryRecord]) -> Vec<f64> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        let day = record.date();
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        *per_day.entry(day).or_default() += record.count;
    }
    per_day.into_values().map(|c| c as f64).collect()
}

/// Drops values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
fn remove_outliers(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let fence = OUTLIER_IQR_FACTOR * (q3 - q1);
    let (low, high) = (q1 - fence, q3 + fence);

    values
        .iter()
        .copied()
        .filter(|v| *v >= low && *v <= high)
        .collect()
}
