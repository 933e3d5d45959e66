//! Core planning logic for the garden planner.
//! This crate owns bed/plant invariants, scheduling rules and persistence.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::bed::{Bed, GridShapeError, PlantingRecord};
pub use model::plant::{PlantLibrary, PlantTrait, PlantUpdate, PlantValidationError, StartMethod};
pub use model::state::{FrostDates, GardenState};
pub use repo::kv_repo::{KeyValueRepository, RepoError, RepoResult, SqliteKeyValueRepository};
pub use schedule::calendar::{project_calendar, Calendar, CalendarEvent, EventKind};
pub use schedule::date::{add_offset, canonicalize, format_display, parse_date, to_canonical};
pub use schedule::succession::{succession_dates, succession_schedule, SuccessionEntry};
pub use service::actions::{Action, ActionError};
pub use service::planner_service::{PlannerError, PlannerResult, PlannerService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
