//! Explicit application state for the planner.
//!
//! # Responsibility
//! - Hold the plant library, the ordered bed list and frost reference dates.
//! - Provide read accessors used by projections and callers.
//!
//! # Invariants
//! - At least one bed always exists.
//! - Bed names are unique; bed order is insertion order.
//! - State is only changed through `GardenState::apply` (see `service::actions`).

use crate::model::bed::Bed;
use crate::model::plant::PlantLibrary;
use crate::schedule::date::to_canonical;
use chrono::{Datelike, Local, NaiveDate};

/// Name of the bed seeded into a fresh planner.
pub const DEFAULT_BED_NAME: &str = "Main Bed";
pub const DEFAULT_BED_ROWS: usize = 3;
pub const DEFAULT_BED_COLS: usize = 8;

/// Spring/fall frost reference dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrostDates {
    /// Last expected spring frost; anchors `spring_offset` scheduling.
    pub spring: NaiveDate,
    /// First expected fall frost; cutoff for succession plantings.
    pub fall: NaiveDate,
}

impl FrostDates {
    pub fn new(spring: NaiveDate, fall: NaiveDate) -> Self {
        Self { spring, fall }
    }

    /// Default frost dates for `year`: April 30 and October 15.
    pub fn for_year(year: i32) -> Self {
        Self {
            spring: NaiveDate::from_ymd_opt(year, 4, 30).unwrap_or_default(),
            fall: NaiveDate::from_ymd_opt(year, 10, 15).unwrap_or_default(),
        }
    }

    /// Default frost dates for the current local year.
    pub fn current_year() -> Self {
        Self::for_year(Local::now().year())
    }

    pub fn spring_iso(&self) -> String {
        to_canonical(self.spring)
    }

    pub fn fall_iso(&self) -> String {
        to_canonical(self.fall)
    }
}

impl Default for FrostDates {
    fn default() -> Self {
        Self::current_year()
    }
}

/// Whole planner state: plants, beds, frost dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GardenState {
    pub(crate) plants: PlantLibrary,
    pub(crate) beds: Vec<Bed>,
    pub(crate) frost: FrostDates,
}

impl GardenState {
    /// Builds a state from loaded parts.
    ///
    /// Duplicate bed names keep their first occurrence; an empty bed list is
    /// replaced by the default bed.
    pub fn new(plants: PlantLibrary, beds: Vec<Bed>, frost: FrostDates) -> Self {
        let mut unique = Vec::<Bed>::with_capacity(beds.len());
        for bed in beds {
            if !unique.iter().any(|existing| existing.name() == bed.name()) {
                unique.push(bed);
            }
        }
        if unique.is_empty() {
            unique = default_beds();
        }
        Self {
            plants,
            beds: unique,
            frost,
        }
    }

    /// Fresh planner state with seed plants and the default bed.
    pub fn with_defaults(frost: FrostDates) -> Self {
        Self::new(PlantLibrary::seeded(), default_beds(), frost)
    }

    pub fn plants(&self) -> &PlantLibrary {
        &self.plants
    }

    pub fn beds(&self) -> &[Bed] {
        &self.beds
    }

    pub fn frost(&self) -> FrostDates {
        self.frost
    }

    pub fn bed(&self, name: &str) -> Option<&Bed> {
        self.beds.iter().find(|bed| bed.name() == name.trim())
    }

    pub fn bed_names(&self) -> Vec<&str> {
        self.beds.iter().map(Bed::name).collect()
    }

    pub(crate) fn bed_index(&self, name: &str) -> Option<usize> {
        self.beds.iter().position(|bed| bed.name() == name.trim())
    }
}

/// Seed bed list for a fresh planner.
pub fn default_beds() -> Vec<Bed> {
    Bed::new(DEFAULT_BED_NAME, DEFAULT_BED_ROWS, DEFAULT_BED_COLS)
        .map(|bed| vec![bed])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{FrostDates, GardenState, DEFAULT_BED_NAME};
    use crate::model::bed::Bed;
    use crate::model::plant::PlantLibrary;

    #[test]
    fn frost_defaults_for_year() {
        let frost = FrostDates::for_year(2024);
        assert_eq!(frost.spring_iso(), "2024-04-30");
        assert_eq!(frost.fall_iso(), "2024-10-15");
    }

    #[test]
    fn new_state_never_has_zero_beds() {
        let state = GardenState::new(PlantLibrary::seeded(), Vec::new(), FrostDates::for_year(2024));
        assert_eq!(state.bed_names(), vec![DEFAULT_BED_NAME]);
        let bed = state.bed(DEFAULT_BED_NAME).expect("default bed");
        assert_eq!((bed.rows(), bed.cols()), (3, 8));
    }

    #[test]
    fn new_state_drops_duplicate_bed_names() {
        let beds = vec![
            Bed::new("A", 1, 1).expect("bed"),
            Bed::new("A", 2, 2).expect("bed"),
            Bed::new("B", 1, 1).expect("bed"),
        ];
        let state = GardenState::new(PlantLibrary::seeded(), beds, FrostDates::for_year(2024));
        assert_eq!(state.bed_names(), vec!["A", "B"]);
        assert_eq!(state.bed("A").map(Bed::rows), Some(1));
    }
}
