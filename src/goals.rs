use crate::models::{GoalProgress, MetricKind, MetricTotals};

pub const ENERGY_GOAL: f64 = 50_000.0;
pub const WATER_GOAL: f64 = 200_000.0;
pub const WASTE_GOAL: f64 = 20_000.0;
pub const EMISSIONS_GOAL: f64 = 40_000.0;

pub fn goal_for(metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Energy => ENERGY_GOAL,
        MetricKind::Water => WATER_GOAL,
        MetricKind::Waste => WASTE_GOAL,
        MetricKind::Emissions => EMISSIONS_GOAL,
    }
}

/// Percentage of goal reached, capped at 100. A zero goal reads as 0%.
pub fn progress_pct(total: f64, goal: f64) -> u8 {
    if goal > 0.0 {
        (total / goal * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

pub fn progress(totals: &MetricTotals) -> GoalProgress {
    GoalProgress {
        energy: progress_pct(totals.energy, ENERGY_GOAL),
        water: progress_pct(totals.water, WATER_GOAL),
        waste: progress_pct(totals.waste, WASTE_GOAL),
        emissions: progress_pct(totals.emissions, EMISSIONS_GOAL),
    }
}
