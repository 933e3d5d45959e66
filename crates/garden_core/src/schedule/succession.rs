//! Succession planting generator.
//!
//! # Invariants
//! - No generated date is on or after the fall cutoff.
//! - A non-positive sow-to-resow cycle generates nothing.
//! - Iterations are bounded by `(cutoff - start) / cycle_days`.

use crate::model::plant::PlantTrait;
use crate::model::state::GardenState;
use crate::schedule::date::{parse_date, shift_days};
use chrono::NaiveDate;

/// Follow-on sowings derived from one planted cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessionEntry {
    pub bed: String,
    pub row: usize,
    pub col: usize,
    pub plant: String,
    /// Date of the original planting.
    pub planted: NaiveDate,
    /// Follow-on sowing dates, ascending.
    pub dates: Vec<NaiveDate>,
}

/// Computes follow-on sowing dates for a succession crop.
///
/// Each step harvests after `days_to_maturity` and resows after
/// `replant_delay`. Generation stops before `fall_cutoff` or when date
/// arithmetic overflows. Non-succession plants yield nothing.
pub fn succession_dates(
    plant: &PlantTrait,
    start: NaiveDate,
    fall_cutoff: NaiveDate,
) -> Vec<NaiveDate> {
    if !plant.succession || plant.cycle_days() <= 0 {
        return Vec::new();
    }

    let maturity = i64::from(plant.days_to_maturity);
    let delay = i64::from(plant.replant_delay);
    let mut dates = Vec::new();
    let mut current = start;
    loop {
        let Some(harvest) = shift_days(current, maturity) else {
            break;
        };
        let Some(next) = shift_days(harvest, delay) else {
            break;
        };
        if next >= fall_cutoff {
            break;
        }
        dates.push(next);
        current = next;
    }
    dates
}

/// Applies [`succession_dates`] to every planted succession crop.
///
/// Cells with unparsable dates or unknown plants are skipped, as are plants
/// whose schedule is empty. The fall frost date is the cutoff.
pub fn succession_schedule(state: &GardenState) -> Vec<SuccessionEntry> {
    let cutoff = state.frost().fall;
    let mut entries = Vec::new();
    for bed in state.beds() {
        for (row, col, record) in bed.planted_cells() {
            let Some(plant) = state.plants().get(&record.plant) else {
                continue;
            };
            let Some(planted) = parse_date(&record.date) else {
                continue;
            };
            let dates = succession_dates(plant, planted, cutoff);
            if dates.is_empty() {
                continue;
            }
            entries.push(SuccessionEntry {
                bed: bed.name().to_string(),
                row,
                col,
                plant: plant.name.clone(),
                planted,
                dates,
            });
        }
    }
    entries
}
