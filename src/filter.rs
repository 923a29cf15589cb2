use crate::errors::{AppError, AppResult};
use crate::models::{parse_day, FilterCriteria, FilterField, FilterOptions, MeasurementRecord};
use std::collections::BTreeSet;

/// Conjunctive match of one record against the active criteria. A record
/// whose date does not parse passes the date bounds.
pub fn matches(record: &MeasurementRecord, criteria: &FilterCriteria) -> bool {
    if let Some(from) = criteria.from {
        if let Some(day) = record.day() {
            if day < from {
                return false;
            }
        }
    }
    if let Some(to) = criteria.to {
        if let Some(day) = record.day() {
            if day > to {
                return false;
            }
        }
    }
    if let Some(department) = &criteria.department {
        if &record.department != department {
            return false;
        }
    }
    if let Some(unit) = &criteria.unit {
        if &record.unit != unit {
            return false;
        }
    }
    if let Some(machine) = &criteria.machine {
        if &record.machine != machine {
            return false;
        }
    }
    if let Some(shift) = &criteria.shift {
        if &record.shift != shift {
            return false;
        }
    }
    true
}

pub fn apply(records: &[MeasurementRecord], criteria: &FilterCriteria) -> Vec<MeasurementRecord> {
    records
        .iter()
        .filter(|record| matches(record, criteria))
        .cloned()
        .collect()
}

/// Distinct sorted picker options over the unfiltered dataset; these never
/// shrink as a side effect of filtering.
pub fn options(records: &[MeasurementRecord]) -> FilterOptions {
    fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
        values.collect::<BTreeSet<_>>().into_iter().collect()
    }

    FilterOptions {
        departments: distinct(records.iter().map(|record| record.department.clone())),
        units: distinct(records.iter().map(|record| record.unit.clone())),
        machines: distinct(records.iter().map(|record| record.machine.clone())),
        shifts: distinct(records.iter().map(|record| record.shift.clone())),
    }
}

/// Merge a single field into the criteria, leaving the others untouched.
/// An empty value clears the field.
pub fn update(
    criteria: &mut FilterCriteria,
    field: FilterField,
    value: Option<String>,
) -> AppResult<()> {
    let value = value.filter(|value| !value.trim().is_empty());
    match field {
        FilterField::From | FilterField::To => {
            let day = match &value {
                Some(raw) => Some(parse_day(raw).ok_or_else(|| {
                    AppError::Validation(format!("'{raw}' is not a valid date (expected YYYY-MM-DD)"))
                })?),
                None => None,
            };
            if field == FilterField::From {
                criteria.from = day;
            } else {
                criteria.to = day;
            }
        }
        FilterField::Department => criteria.department = value,
        FilterField::Unit => criteria.unit = value,
        FilterField::Machine => criteria.machine = value,
        FilterField::Shift => criteria.shift = value,
    }
    Ok(())
}
