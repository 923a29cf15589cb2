use crate::models::{
    parse_day, AggregatePoint, DepartmentTotal, MeasurementRecord, MetricKind, MetricTotals,
    OverallPoint,
};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn date_order(a: &str, b: &str) -> Ordering {
    let key = |date: &str| (parse_day(date).unwrap_or(NaiveDate::MIN), date.to_string());
    key(a).cmp(&key(b))
}

/// Per-day sum of one metric, grouped by exact date string, rounded to one
/// decimal place, ascending by calendar date. Aggregating an already
/// one-row-per-day sequence again is a no-op.
pub fn by_date(records: &[MeasurementRecord], metric: MetricKind) -> Vec<AggregatePoint> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *sums.entry(record.date.as_str()).or_insert(0.0) += record.metric(metric);
    }

    let mut points: Vec<AggregatePoint> = sums
        .into_iter()
        .map(|(date, value)| AggregatePoint {
            date: date.to_string(),
            value: round1(value),
        })
        .collect();
    points.sort_by(|a, b| date_order(&a.date, &b.date));
    points
}

/// Un-grouped four-metric sums over the subset, for the headline tiles and
/// goal progress.
pub fn totals(records: &[MeasurementRecord]) -> MetricTotals {
    let mut totals = MetricTotals::default();
    for record in records {
        totals.energy += record.metric(MetricKind::Energy);
        totals.water += record.metric(MetricKind::Water);
        totals.waste += record.metric(MetricKind::Waste);
        totals.emissions += record.metric(MetricKind::Emissions);
    }
    MetricTotals {
        energy: round1(totals.energy),
        water: round1(totals.water),
        waste: round1(totals.waste),
        emissions: round1(totals.emissions),
    }
}

/// Merged per-day series across all four metrics, same grouping and ordering
/// rules as `by_date`.
pub fn overall_by_date(records: &[MeasurementRecord]) -> Vec<OverallPoint> {
    let mut merged: HashMap<&str, MetricTotals> = HashMap::new();
    for record in records {
        let entry = merged.entry(record.date.as_str()).or_default();
        entry.energy += record.metric(MetricKind::Energy);
        entry.water += record.metric(MetricKind::Water);
        entry.waste += record.metric(MetricKind::Waste);
        entry.emissions += record.metric(MetricKind::Emissions);
    }

    let mut points: Vec<OverallPoint> = merged
        .into_iter()
        .map(|(date, sums)| OverallPoint {
            date: date.to_string(),
            energy: round1(sums.energy),
            water: round1(sums.water),
            waste: round1(sums.waste),
            emissions: round1(sums.emissions),
        })
        .collect();
    points.sort_by(|a, b| date_order(&a.date, &b.date));
    points
}

/// Top departments by metric sum, highest first.
pub fn department_hotspots(
    records: &[MeasurementRecord],
    metric: MetricKind,
    limit: usize,
) -> Vec<DepartmentTotal> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *sums.entry(record.department.as_str()).or_insert(0.0) += record.metric(metric);
    }

    let mut totals: Vec<DepartmentTotal> = sums
        .into_iter()
        .map(|(department, value)| DepartmentTotal {
            department: department.to_string(),
            value: round1(value),
        })
        .collect();
    totals.sort_by(|a, b| b.value.total_cmp(&a.value));
    totals.truncate(limit);
    totals
}

#[cfg(test)]
mod tests {
    use super::{by_date, department_hotspots, overall_by_date, totals};
    use crate::models::{MeasurementRecord, MetricKind};

    fn record(date: &str, department: &str, energy: f64) -> MeasurementRecord {
        MeasurementRecord {
            date: date.to_string(),
            department: department.to_string(),
            unit: "Unit A".to_string(),
            machine: "Machine 1".to_string(),
            shift: "1".to_string(),
            energy,
            water: energy * 2.0,
            waste: energy / 10.0,
            emissions: energy / 2.0,
        }
    }

    #[test]
    fn groups_by_date_and_rounds() {
        let records = vec![
            record("2025-01-01", "Dyeing", 100.0),
            record("2025-01-01", "Dyeing", 60.0),
            record("2025-01-02", "Dyeing", 40.0),
        ];
        let series = by_date(&records, MetricKind::Energy);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2025-01-01");
        assert_eq!(series[0].value, 160.0);
        assert_eq!(series[1].date, "2025-01-02");
        assert_eq!(series[1].value, 40.0);
    }

    #[test]
    fn output_is_sorted_by_calendar_date() {
        let records = vec![
            record("2025-12-31", "Dyeing", 1.0),
            record("2025-01-02", "Dyeing", 2.0),
            record("2025-07-15", "Dyeing", 3.0),
        ];
        let series = by_date(&records, MetricKind::Energy);
        let dates: Vec<&str> = series.iter().map(|point| point.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-02", "2025-07-15", "2025-12-31"]);
    }

    #[test]
    fn aggregation_is_idempotent_over_daily_rows() {
        let records = vec![
            record("2025-01-01", "Dyeing", 100.0),
            record("2025-01-01", "Dyeing", 60.0),
            record("2025-01-02", "Dyeing", 40.0),
        ];
        let first = by_date(&records, MetricKind::Energy);

        // Re-expand each point as a single record and aggregate again.
        let expanded: Vec<MeasurementRecord> = first
            .iter()
            .map(|point| record(&point.date, "Dyeing", point.value))
            .collect();
        assert_eq!(by_date(&expanded, MetricKind::Energy), first);
    }

    #[test]
    fn group_sums_preserve_the_total() {
        let records = vec![
            record("2025-01-01", "Dyeing", 10.25),
            record("2025-01-01", "Dyeing", 20.33),
            record("2025-01-02", "Dyeing", 5.17),
            record("2025-01-03", "Dyeing", 7.01),
        ];
        let raw_total: f64 = records.iter().map(|r| r.energy).sum();
        let series = by_date(&records, MetricKind::Energy);
        let series_total: f64 = series.iter().map(|point| point.value).sum();
        assert!((raw_total - series_total).abs() <= 0.1 * series.len() as f64);
    }

    #[test]
    fn totals_cover_all_four_metrics() {
        let records = vec![
            record("2025-01-01", "Dyeing", 100.0),
            record("2025-01-02", "Weaving", 50.0),
        ];
        let totals = totals(&records);
        assert_eq!(totals.energy, 150.0);
        assert_eq!(totals.water, 300.0);
        assert_eq!(totals.waste, 15.0);
        assert_eq!(totals.emissions, 75.0);
    }

    #[test]
    fn empty_subset_yields_empty_series_and_zero_totals() {
        assert!(by_date(&[], MetricKind::Water).is_empty());
        assert_eq!(totals(&[]).water, 0.0);
    }

    #[test]
    fn overall_series_merges_all_metrics_per_day() {
        let records = vec![
            record("2025-01-01", "Dyeing", 100.0),
            record("2025-01-01", "Weaving", 60.0),
        ];
        let series = overall_by_date(&records);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].energy, 160.0);
        assert_eq!(series[0].water, 320.0);
    }

    #[test]
    fn hotspots_rank_departments_descending() {
        let records = vec![
            record("2025-01-01", "Dyeing", 100.0),
            record("2025-01-02", "Weaving", 300.0),
            record("2025-01-03", "Spinning", 200.0),
        ];
        let hotspots = department_hotspots(&records, MetricKind::Energy, 2);
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].department, "Weaving");
        assert_eq!(hotspots[1].department, "Spinning");
    }
}
