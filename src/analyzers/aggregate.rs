use rust_decimal::{Decimal, RoundingStrategy};

use crate::analyzers::types::{CutoverMetric, MigrationsReport, SupplierCombinationStat};
use crate::analyzers::utility::mean;

/// Mean cutover duration across all metrics, rounded half-up to one decimal place.
///
/// Rounding is applied to the exact binary value of the mean. Returns `None`
/// for an empty slice.
pub fn calculate_mean_cutover(metrics: &[CutoverMetric]) -> Option<Decimal> {
    if metrics.is_empty() {
        return None;
    }
    let durations: Vec<f64> = metrics.iter().map(|m| m.duration() as f64).collect();

    let mut rounded = Decimal::from_f64_retain(mean(&durations))?
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    // whole numbers keep their trailing ".0"
    rounded.rescale(1);
    Some(rounded)
}

/// Groups metrics by (source system, target system) in order of first appearance.
///
/// Each group's mean duration is left unrounded.
pub fn calculate_supplier_combination_stats(metrics: &[CutoverMetric]) -> Vec<SupplierCombinationStat> {
    let mut groups: Vec<(&str, &str, Vec<f64>)> = Vec::new();

    for metric in metrics {
        let source = metric.systems.source_system.as_str();
        let target = metric.systems.target_system.as_str();
        let duration = metric.duration() as f64;

        match groups.iter_mut().find(|(s, t, _)| *s == source && *t == target) {
            Some((_, _, durations)) => durations.push(duration),
            None => groups.push((source, target, vec![duration])),
        }
    }

    groups
        .into_iter()
        .map(|(source, target, durations)| SupplierCombinationStat {
            source_system: source.to_string(),
            target_system: target.to_string(),
            count: durations.len(),
            mean_duration: mean(&durations),
        })
        .collect()
}

/// Builds the published report, or `None` when there is nothing to publish.
pub fn build_report(metrics: Vec<CutoverMetric>) -> Option<MigrationsReport> {
    let mean_cutover_duration = calculate_mean_cutover(&metrics)?;
    let supplier_combination_stats = calculate_supplier_combination_stats(&metrics);

    Some(MigrationsReport {
        mean_cutover_duration,
        supplier_combination_stats,
        migrations: metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CutoverWindow, OrganisationDetails, SystemDetails};
    use chrono::DateTime;

    fn metric(source: &str, target: &str, duration: i64) -> CutoverMetric {
        let start = DateTime::parse_from_rfc3339("2021-12-02T00:00:00+00:00").unwrap();
        CutoverMetric::merge(
            CutoverWindow {
                cutover_startdate: start,
                cutover_enddate: start + chrono::Duration::days(duration),
                cutover_duration: duration,
            },
            OrganisationDetails {
                ods_code: "ods".into(),
                ccg_name: "ccg".into(),
                practice_name: "practice".into(),
            },
            SystemDetails {
                source_system: source.into(),
                target_system: target.into(),
            },
        )
    }

    fn mean_of(durations: &[i64]) -> String {
        let metrics: Vec<_> = durations.iter().map(|d| metric("A", "B", *d)).collect();
        calculate_mean_cutover(&metrics).unwrap().to_string()
    }

    #[test]
    fn test_mean_cutover_rounds_half_up_to_one_place() {
        assert_eq!(mean_of(&[1, 1]), "1.0");
        assert_eq!(mean_of(&[4, 2]), "3.0");
        assert_eq!(mean_of(&[4, 3]), "3.5");
        assert_eq!(mean_of(&[2, 1, 1, 1]), "1.3");
        assert_eq!(mean_of(&[2, 1, 1, 1, 1, 1, 1]), "1.1");
    }

    #[test]
    fn test_mean_cutover_ignores_order() {
        assert_eq!(mean_of(&[1, 1, 1, 2]), mean_of(&[2, 1, 1, 1]));
    }

    #[test]
    fn test_mean_cutover_of_nothing() {
        assert_eq!(calculate_mean_cutover(&[]), None);
    }

    #[test]
    fn test_supplier_combinations_are_grouped() {
        let metrics = vec![
            metric("A", "B", 4),
            metric("A", "B", 4),
            metric("C", "B", 4),
            metric("C", "B", 4),
        ];

        let stats = calculate_supplier_combination_stats(&metrics);

        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].source_system.as_str(), stats[0].count), ("A", 2));
        assert_eq!((stats[1].source_system.as_str(), stats[1].count), ("C", 2));
    }

    #[test]
    fn test_supplier_combination_mean_is_unrounded() {
        let stats = calculate_supplier_combination_stats(&[metric("A", "B", 4), metric("A", "B", 8)]);
        assert_eq!(stats[0].mean_duration, 6.0);

        let stats = calculate_supplier_combination_stats(&[
            metric("A", "B", 1),
            metric("A", "B", 1),
            metric("A", "B", 2),
        ]);
        assert!((stats[0].mean_duration - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_supplier_combinations_keep_first_appearance_order() {
        let metrics = vec![
            metric("C", "B", 1),
            metric("A", "B", 2),
            metric("C", "B", 3),
            metric("B", "A", 4),
        ];

        let stats = calculate_supplier_combination_stats(&metrics);
        let pairs: Vec<_> = stats
            .iter()
            .map(|s| (s.source_system.as_str(), s.target_system.as_str()))
            .collect();

        assert_eq!(pairs, vec![("C", "B"), ("A", "B"), ("B", "A")]);
        assert_eq!(stats[0].mean_duration, 2.0);
    }

    #[test]
    fn test_build_report() {
        assert!(build_report(vec![]).is_none());

        let report = build_report(vec![metric("SystmOne", "EMIS Web", 4)]).unwrap();
        assert_eq!(report.mean_cutover_duration.to_string(), "4.0");
        assert_eq!(report.supplier_combination_stats.len(), 1);
        assert_eq!(report.migrations.len(), 1);
    }
}
