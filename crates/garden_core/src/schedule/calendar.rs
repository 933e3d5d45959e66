//! Calendar projection over planted beds.
//!
//! # Responsibility
//! - Derive a date-indexed event list from every planted cell.
//! - Resolve plant traits by name to add indoor-start events.
//!
//! # Invariants
//! - Dates iterate in ascending order.
//! - Events on one date keep discovery order: beds in state order, then
//!   row-major cells, outdoor before indoor for the same cell.
//! - A missing trait never drops the outdoor event.
//! - A cell with an unparsable date contributes no events.

use crate::model::bed::Bed;
use crate::model::plant::PlantLibrary;
use crate::schedule::date::{parse_date, shift_days, to_canonical};
use crate::schedule::succession::succession_dates;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Kind of derived calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Outdoor planting or transplant on the record date.
    Outdoor,
    /// Seed-starting date for indoor-started plants.
    IndoorStart,
    /// Follow-on sowing of a succession crop.
    Succession,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Outdoor => "outdoors",
            Self::IndoorStart => "indoors",
            Self::Succession => "succession",
        }
    }
}

/// One derived calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub kind: EventKind,
    pub plant: String,
    pub bed: String,
}

impl CalendarEvent {
    /// Display text, e.g. `Tomato (indoors)`.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl Display for CalendarEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.plant, self.kind.label())
    }
}

/// Date-indexed projection of planting events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calendar {
    days: BTreeMap<NaiveDate, Vec<CalendarEvent>>,
}

impl Calendar {
    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    /// Iterates `(date, events)` in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[CalendarEvent])> {
        self.days
            .iter()
            .map(|(date, events)| (*date, events.as_slice()))
    }

    /// Ascending `YYYY-MM-DD` keys.
    pub fn dates(&self) -> Vec<String> {
        self.days.keys().copied().map(to_canonical).collect()
    }

    /// Events on `date`; empty for unknown or unparsable dates.
    pub fn events_on(&self, date: &str) -> &[CalendarEvent] {
        parse_date(date)
            .and_then(|parsed| self.days.get(&parsed))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// ISO date → event descriptions.
    pub fn to_description_map(&self) -> BTreeMap<String, Vec<String>> {
        self.days
            .iter()
            .map(|(date, events)| {
                (
                    to_canonical(*date),
                    events.iter().map(CalendarEvent::description).collect(),
                )
            })
            .collect()
    }

    fn push(&mut self, date: NaiveDate, event: CalendarEvent) {
        self.days.entry(date).or_default().push(event);
    }
}

/// Projects outdoor and indoor-start events for every planted cell.
pub fn project_calendar(beds: &[Bed], plants: &PlantLibrary) -> Calendar {
    let mut calendar = Calendar::default();
    for bed in beds {
        for (_, _, record) in bed.planted_cells() {
            let Some(outdoor) = parse_date(&record.date) else {
                continue;
            };
            calendar.push(outdoor, event(EventKind::Outdoor, &record.plant, bed));

            let indoor = plants
                .get(&record.plant)
                .and_then(|plant| plant.indoor_start_offset())
                .and_then(|offset| shift_days(outdoor, i64::from(offset)));
            if let Some(indoor) = indoor {
                calendar.push(indoor, event(EventKind::IndoorStart, &record.plant, bed));
            }
        }
    }
    calendar
}

/// Like [`project_calendar`], plus succession sowings before `fall_cutoff`.
///
/// Succession events follow all base events discovered for the same date.
pub fn project_with_successions(
    beds: &[Bed],
    plants: &PlantLibrary,
    fall_cutoff: NaiveDate,
) -> Calendar {
    let mut calendar = project_calendar(beds, plants);
    for bed in beds {
        for (_, _, record) in bed.planted_cells() {
            let (Some(plant), Some(planted)) = (plants.get(&record.plant), parse_date(&record.date))
            else {
                continue;
            };
            for date in succession_dates(plant, planted, fall_cutoff) {
                calendar.push(date, event(EventKind::Succession, &record.plant, bed));
            }
        }
    }
    calendar
}

fn event(kind: EventKind, plant: &str, bed: &Bed) -> CalendarEvent {
    CalendarEvent {
        kind,
        plant: plant.to_string(),
        bed: bed.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{project_calendar, project_with_successions, EventKind};
    use crate::model::bed::{Bed, PlantingRecord};
    use crate::model::plant::PlantLibrary;
    use crate::schedule::date::parse_date;

    fn bed_with(cells: &[(usize, usize, &str, &str)]) -> Bed {
        let mut bed = Bed::new("Main Bed", 3, 8).expect("valid bed");
        for (row, col, plant, date) in cells {
            *bed.cell_mut(*row, *col).expect("in range") =
                Some(PlantingRecord::new(*plant, *date, 0));
        }
        bed
    }

    #[test]
    fn tomato_projects_outdoor_and_indoor_events() {
        let beds = vec![bed_with(&[(0, 0, "Tomato", "2024-05-15")])];
        let calendar = project_calendar(&beds, &PlantLibrary::seeded());

        assert_eq!(calendar.dates(), vec!["2024-03-20", "2024-05-15"]);
        let outdoor = calendar.events_on("2024-05-15");
        assert_eq!(outdoor.len(), 1);
        assert_eq!(outdoor[0].kind, EventKind::Outdoor);
        assert_eq!(outdoor[0].description(), "Tomato (outdoors)");
        let indoor = calendar.events_on("2024-03-20");
        assert_eq!(indoor[0].description(), "Tomato (indoors)");
    }

    #[test]
    fn unknown_plant_keeps_outdoor_event_only() {
        let beds = vec![bed_with(&[(1, 1, "Okra", "2024-06-01")])];
        let calendar = project_calendar(&beds, &PlantLibrary::seeded());
        assert_eq!(calendar.event_count(), 1);
        assert_eq!(calendar.events_on("2024-06-01")[0].plant, "Okra");
    }

    #[test]
    fn direct_sown_plant_has_no_indoor_event() {
        let beds = vec![bed_with(&[(0, 0, "Carrot", "2024-04-16")])];
        let calendar = project_calendar(&beds, &PlantLibrary::seeded());
        assert_eq!(calendar.event_count(), 1);
    }

    #[test]
    fn invalid_record_date_is_omitted() {
        let beds = vec![bed_with(&[(0, 0, "Tomato", "someday")])];
        assert!(project_calendar(&beds, &PlantLibrary::seeded()).is_empty());
    }

    #[test]
    fn events_keep_discovery_order_within_a_date() {
        let beds = vec![
            bed_with(&[(0, 1, "Carrot", "2024-04-16"), (0, 0, "Okra", "2024-04-16")]),
            Bed::new("Side", 1, 1).expect("bed"),
        ];
        let calendar = project_calendar(&beds, &PlantLibrary::seeded());
        let names = calendar
            .events_on("2024-04-16")
            .iter()
            .map(|event| event.plant.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Okra", "Carrot"]);
    }

    #[test]
    fn successions_are_appended_before_cutoff() {
        let beds = vec![bed_with(&[(0, 0, "Lettuce", "2024-04-16")])];
        let cutoff = parse_date("2024-10-15").expect("cutoff");
        let calendar = project_with_successions(&beds, &PlantLibrary::seeded(), cutoff);
        let successions = calendar
            .iter()
            .flat_map(|(_, events)| events.iter())
            .filter(|event| event.kind == EventKind::Succession)
            .count();
        assert_eq!(successions, 3);
        assert_eq!(
            calendar.events_on("2024-06-07")[0].description(),
            "Lettuce (succession)"
        );
        assert!(calendar.iter().all(|(date, _)| date < cutoff));
    }
}
