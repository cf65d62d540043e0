//! Cutover window detection over the old and new systems' daily traffic.

use tracing::debug;

use crate::analyzers::threshold::validate_threshold;
use crate::analyzers::types::CutoverWindow;
use crate::error::MetricsError;
use crate::telemetry::{TelemetryRecord, TelemetrySeries};

/// Finds the cutover window given a known threshold.
///
/// `pre` is the old system's traffic. Scanning it backwards from the most
/// recent day, the first day above `threshold` is the last day of normal
/// activity; the day after it starts the cutover. `post` is the new system's
/// traffic, scanned forwards once: its first day above `threshold` ends the
/// cutover.
///
/// # Errors
///
/// - [`MetricsError::CutoverStartOutOfRange`] if no pre day is above the
///   threshold, or only the most recent one is.
/// - [`MetricsError::CutoverEndOutOfRange`] if no post day is above it.
/// - [`MetricsError::TelemetryUnavailable`] if a record cannot be decoded.
pub fn detect_cutover(
    threshold: f64,
    pre: TelemetrySeries,
    post: TelemetrySeries,
) -> Result<CutoverWindow, MetricsError> {
    let pre = pre.materialize()?;
    detect_with_materialized_pre(threshold, &pre, post)
}

/// Like [`detect_cutover`], reading the threshold embedded in the telemetry.
///
/// The first pre record carrying a threshold is used, falling back to the
/// first post record with one.
pub fn detect_cutover_with_embedded_threshold(
    pre: TelemetrySeries,
    post: TelemetrySeries,
) -> Result<CutoverWindow, MetricsError> {
    let pre_asid = pre.asid().to_string();
    let pre = pre.materialize()?;

    if let Some(threshold) = pre.iter().find_map(|r| r.threshold) {
        return detect_with_materialized_pre(validate_threshold(threshold)?, &pre, post);
    }

    // Nothing in pre: the threshold has to come from post, which is single-pass.
    let post_asid = post.asid().to_string();
    let post = post.materialize()?;
    let threshold = post.iter().find_map(|r| r.threshold).ok_or_else(|| {
        MetricsError::telemetry(
            &pre_asid,
            format!("no baseline threshold embedded in telemetry for {pre_asid} or {post_asid}"),
        )
    })?;

    detect_with_materialized_pre(
        validate_threshold(threshold)?,
        &pre,
        TelemetrySeries::from_records(&post_asid, post),
    )
}

fn detect_with_materialized_pre(
    threshold: f64,
    pre: &[TelemetryRecord],
    post: TelemetrySeries,
) -> Result<CutoverWindow, MetricsError> {
    let start = cutover_start(threshold, pre)?;
    let end = cutover_end(threshold, post)?;

    let cutover_duration = (end.date() - start.date()).num_days();
    debug!(
        threshold,
        start = %start.timestamp,
        end = %end.timestamp,
        cutover_duration,
        "Cutover window detected"
    );

    Ok(CutoverWindow {
        cutover_startdate: start.timestamp,
        cutover_enddate: end.timestamp,
        cutover_duration,
    })
}

/// Most recent quiet day following the last above-threshold day.
fn cutover_start(threshold: f64, pre: &[TelemetryRecord]) -> Result<&TelemetryRecord, MetricsError> {
    let out_of_range = || MetricsError::CutoverStartOutOfRange { threshold };

    let last_active = pre
        .iter()
        .rposition(|r| r.count as f64 > threshold)
        .ok_or_else(out_of_range)?;

    pre.get(last_active + 1).ok_or_else(out_of_range)
}

/// First above-threshold day of the new system.
fn cutover_end(threshold: f64, post: TelemetrySeries) -> Result<TelemetryRecord, MetricsError> {
    for record in post {
        let record = record?;
        if record.count as f64 > threshold {
            return Ok(record);
        }
    }
    Err(MetricsError::CutoverEndOutOfRange { threshold })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Days, FixedOffset, NaiveDate};

    const THRESHOLD: f64 = 1044.7268404372467;

    fn series(asid: &str, first_day: &str, counts: &[u64], threshold: Option<f64>) -> TelemetrySeries {
        let start =
            DateTime::<FixedOffset>::parse_from_rfc3339(&format!("{first_day}T00:00:00+00:00")).unwrap();
        let records = counts
            .iter()
            .enumerate()
            .map(|(i, count)| {
                let record = TelemetryRecord::new(start + Days::new(i as u64), *count);
                match threshold {
                    Some(t) => record.with_threshold(t),
                    None => record,
                }
            })
            .collect();
        TelemetrySeries::from_records(asid, records)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detects_window_with_embedded_threshold() {
        // Pre: 2021-11-29 .. 2021-12-04, post: 2021-12-05 .. 2021-12-08
        let pre = series("1234", "2021-11-29", &[2000, 2854, 2754, 200, 200, 200], Some(THRESHOLD));
        let post = series("5678", "2021-12-05", &[300, 2854, 2754, 2554], Some(THRESHOLD));

        let window = detect_cutover_with_embedded_threshold(pre, post).unwrap();

        assert_eq!(window.cutover_startdate.date_naive(), date(2021, 12, 2));
        assert_eq!(window.cutover_enddate.date_naive(), date(2021, 12, 6));
        assert_eq!(window.cutover_duration, 4);
    }

    #[test]
    fn test_threshold_may_come_from_post_only() {
        let pre = series("1234", "2021-11-29", &[2000, 2854, 2754, 200, 200, 200], None);
        let post = series("5678", "2021-12-05", &[300, 2854, 2754, 2554], Some(THRESHOLD));

        let window = detect_cutover_with_embedded_threshold(pre, post).unwrap();

        assert_eq!(window.cutover_duration, 4);
    }

    #[test]
    fn test_missing_embedded_threshold_is_unavailable_telemetry() {
        let pre = series("1234", "2021-11-29", &[2000, 200], None);
        let post = series("5678", "2021-12-05", &[2000], None);

        let err = detect_cutover_with_embedded_threshold(pre, post).unwrap_err();
        assert!(matches!(err, MetricsError::TelemetryUnavailable { .. }));
    }

    #[test]
    fn test_non_positive_embedded_threshold_is_invalid() {
        let pre = series("1234", "2021-11-29", &[2000, 200], Some(0.0));
        let post = series("5678", "2021-12-05", &[2000], Some(0.0));

        let err = detect_cutover_with_embedded_threshold(pre, post).unwrap_err();
        assert!(matches!(err, MetricsError::ThresholdInvalid(_)));
    }

    #[test]
    fn test_quiet_pre_series_is_start_out_of_range() {
        let pre = series("1234", "2021-11-29", &[100, 200, 300], None);
        let post = series("5678", "2021-12-05", &[2000], None);

        let err = detect_cutover(THRESHOLD, pre, post).unwrap_err();
        assert!(matches!(err, MetricsError::CutoverStartOutOfRange { .. }));
    }

    #[test]
    fn test_active_last_pre_day_is_start_out_of_range() {
        let pre = series("1234", "2021-11-29", &[200, 2000, 2000], None);
        let post = series("5678", "2021-12-05", &[2000], None);

        let err = detect_cutover(THRESHOLD, pre, post).unwrap_err();
        assert!(matches!(err, MetricsError::CutoverStartOutOfRange { .. }));
    }

    #[test]
    fn test_quiet_post_series_is_end_out_of_range() {
        let pre = series("1234", "2021-11-29", &[2000, 200], None);
        let post = series("5678", "2021-12-05", &[300, 400, 500], None);

        let err = detect_cutover(THRESHOLD, pre, post).unwrap_err();
        assert!(matches!(err, MetricsError::CutoverEndOutOfRange { .. }));
    }

    #[test]
    fn test_count_equal_to_threshold_is_quiet() {
        let pre = series("1234", "2021-11-29", &[1001, 1000, 1000], None);
        let post = series("5678", "2021-12-01", &[1000, 1001], None);

        let window = detect_cutover(1000.0, pre, post).unwrap();

        assert_eq!(window.cutover_startdate.date_naive(), date(2021, 11, 30));
        assert_eq!(window.cutover_enddate.date_naive(), date(2021, 12, 2));
        assert_eq!(window.cutover_duration, 2);
    }

    #[test]
    fn test_duration_is_negative_for_overlapping_activity() {
        let pre = series("1234", "2021-12-01", &[2000, 2000, 2000, 200], None);
        let post = series("5678", "2021-11-29", &[2000], None);

        let window = detect_cutover(THRESHOLD, pre, post).unwrap();
        assert_eq!(window.cutover_duration, -5);
    }

    #[test]
    fn test_post_scan_stops_at_first_active_day() {
        let pre = series("1234", "2021-11-29", &[2000, 200], None);
        let records: Vec<Result<TelemetryRecord, String>> = vec![
            Ok(TelemetryRecord::new(
                DateTime::parse_from_rfc3339("2021-12-01T00:00:00+00:00").unwrap(),
                5000,
            )),
            Err("never decoded".to_string()),
        ];
        let post = TelemetrySeries::from_stream("5678", records);

        let window = detect_cutover(THRESHOLD, pre, post).unwrap();
        assert_eq!(window.cutover_duration, 1);
    }
}
