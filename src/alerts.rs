use crate::models::{AcknowledgementSet, Alert, MeasurementRecord, MetricKind};

pub const ENERGY_ALERT_THRESHOLD: f64 = 180.0;
pub const EMISSIONS_ALERT_THRESHOLD: f64 = 120.0;
pub const MAX_ALERTS: usize = 30;

/// Stateless full scan of the active subset: a record contributes an energy
/// alert, an emissions alert, both, or neither. The result is ranked by value
/// descending and capped at `MAX_ALERTS`.
pub fn scan(records: &[MeasurementRecord]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for record in records {
        if record.metric(MetricKind::Energy) > ENERGY_ALERT_THRESHOLD {
            alerts.push(Alert {
                date: record.date.clone(),
                department: record.department.clone(),
                machine: record.machine.clone(),
                metric: MetricKind::Energy,
                value: record.metric(MetricKind::Energy),
                message: "High energy usage".to_string(),
            });
        }
        if record.metric(MetricKind::Emissions) > EMISSIONS_ALERT_THRESHOLD {
            alerts.push(Alert {
                date: record.date.clone(),
                department: record.department.clone(),
                machine: record.machine.clone(),
                metric: MetricKind::Emissions,
                value: record.metric(MetricKind::Emissions),
                message: "High emissions".to_string(),
            });
        }
    }

    alerts.sort_by(|a, b| b.value.total_cmp(&a.value));
    alerts.truncate(MAX_ALERTS);
    alerts
}

/// Presentation-side view: acknowledged alerts stay in the derivation but are
/// excluded from the active feed.
pub fn active(alerts: &[Alert], acknowledged: &AcknowledgementSet) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|alert| !acknowledged.contains(&alert.identity_key()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{active, scan, MAX_ALERTS};
    use crate::models::{AcknowledgementSet, MeasurementRecord, MetricKind};

    fn record(date: &str, energy: f64, emissions: f64) -> MeasurementRecord {
        MeasurementRecord {
            date: date.to_string(),
            department: "Dyeing".to_string(),
            unit: "Unit A".to_string(),
            machine: "Machine 1".to_string(),
            shift: "1".to_string(),
            energy,
            water: 0.0,
            waste: 0.0,
            emissions,
        }
    }

    #[test]
    fn energy_over_threshold_raises_exactly_one_alert() {
        let alerts = scan(&[record("2025-03-01", 200.0, 50.0)]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, MetricKind::Energy);
        assert_eq!(alerts[0].value, 200.0);
        assert_eq!(alerts[0].message, "High energy usage");
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert!(scan(&[record("2025-03-01", 180.0, 120.0)]).is_empty());
    }

    #[test]
    fn one_record_can_raise_both_alerts() {
        let alerts = scan(&[record("2025-03-01", 190.0, 130.0)]);
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn alerts_are_ranked_descending_and_capped() {
        let records: Vec<MeasurementRecord> = (0..40)
            .map(|i| record("2025-03-01", 181.0 + i as f64, 0.0))
            .collect();
        let alerts = scan(&records);
        assert_eq!(alerts.len(), MAX_ALERTS);
        for pair in alerts.windows(2) {
            assert!(pair[0].value >= pair[1].value);
        }
        assert_eq!(alerts[0].value, 220.0);
    }

    #[test]
    fn acknowledged_alerts_leave_the_active_feed_only() {
        let alerts = scan(&[
            record("2025-03-01", 200.0, 0.0),
            record("2025-03-02", 190.0, 0.0),
        ]);
        let mut acknowledged = AcknowledgementSet::new();
        acknowledged.insert(alerts[0].identity_key());

        let feed = active(&alerts, &acknowledged);
        assert_eq!(alerts.len(), 2);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].date, "2025-03-02");
    }
}
