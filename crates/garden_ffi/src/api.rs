//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose bed, plant and calendar use cases to Dart via FRB.
//! - Flatten planner results into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call is one load-apply-save cycle, serialized process-wide.
//! - Failures come back as `ok = false` with a message and error code.

use garden_core::db::open_db;
use garden_core::{
    core_version as core_version_inner, format_display, init_logging as init_logging_inner,
    ping as ping_inner, to_canonical, Action, Bed, Calendar, FrostDates, GardenState,
    PlannerError, PlannerService, PlantTrait, PlantUpdate, SqliteKeyValueRepository, StartMethod,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const PLANNER_DB_FILE_NAME: &str = "garden_planner.sqlite3";
const PLANNER_DB_ENV: &str = "GARDEN_PLANNER_DB_PATH";
static PLANNER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static PLANNER_LOCK: Mutex<()> = Mutex::new(());

type SqlitePlanner<'conn> = PlannerService<SqliteKeyValueRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Frost reference dates supplied by the UI. `None` keeps this year's default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrostInput {
    /// Last spring frost, `YYYY-MM-DD`.
    pub spring: Option<String>,
    /// First fall frost, `YYYY-MM-DD`.
    pub fall: Option<String>,
}

/// One planted square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedCellItem {
    pub row: u32,
    pub col: u32,
    pub plant: String,
    /// Canonical `YYYY-MM-DD` planting date.
    pub date: String,
    /// Short display date such as `May 15`.
    pub display_date: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedItem {
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    /// Planted squares in row-major order; empty squares are omitted.
    pub cells: Vec<BedCellItem>,
}

/// Bed list envelope returned by every bed use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedsResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Stable rejection code, e.g. `unknown_bed`.
    pub error_code: Option<String>,
    /// Beds after the call; empty on failure.
    pub beds: Vec<BedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantItem {
    pub name: String,
    pub days_to_maturity: i32,
    pub spring_offset: i32,
    pub indoor_offset: Option<i32>,
    /// `indoor` or `outdoor`.
    pub start_method: String,
    pub succession: bool,
    pub replant_delay: i32,
    pub notes: String,
}

/// Plant library envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantsResponse {
    pub ok: bool,
    pub message: String,
    pub error_code: Option<String>,
    pub plants: Vec<PlantItem>,
}

/// Trait edit from the library editor. `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantEditInput {
    pub name: Option<String>,
    pub days_to_maturity: Option<i32>,
    pub spring_offset: Option<i32>,
    pub indoor_offset: Option<i32>,
    /// Clears the indoor offset; wins over `indoor_offset`.
    pub clear_indoor_offset: bool,
    /// `indoor` or `outdoor`.
    pub start_method: Option<String>,
    pub succession: Option<bool>,
    pub replant_delay: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventItem {
    /// `outdoors`, `indoors` or `succession`.
    pub kind: String,
    pub plant: String,
    pub bed: String,
    /// Label such as `Tomato (indoors)`.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDayItem {
    pub date: String,
    pub display_date: String,
    pub events: Vec<CalendarEventItem>,
}

/// Calendar envelope; days ascend by date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarResponse {
    pub ok: bool,
    pub message: String,
    pub days: Vec<CalendarDayItem>,
}

/// Lists all beds with their planted squares.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_list() -> BedsResponse {
    beds_response("bed_list", with_planner(&FrostInput::default(), |_| Ok(())))
}

/// Adds an empty bed. Defaults: `New Bed N`, 3 x 6.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_add(name: Option<String>, rows: Option<u32>, cols: Option<u32>) -> BedsResponse {
    let action = Action::AddBed {
        name,
        rows: rows.map(to_index),
        cols: cols.map(to_index),
    };
    beds_response("bed_add", dispatch(&FrostInput::default(), action))
}

#[flutter_rust_bridge::frb(sync)]
pub fn bed_rename(from: String, to: String) -> BedsResponse {
    beds_response(
        "bed_rename",
        dispatch(&FrostInput::default(), Action::RenameBed { from, to }),
    )
}

/// Deletes a bed; the last remaining bed is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_delete(bed: String) -> BedsResponse {
    beds_response(
        "bed_delete",
        dispatch(&FrostInput::default(), Action::DeleteBed { bed }),
    )
}

/// Grows or shrinks a bed. Squares outside the new bounds are dropped.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_resize(bed: String, row_delta: i32, col_delta: i32) -> BedsResponse {
    let action = Action::ResizeBed {
        bed,
        row_delta: i64::from(row_delta),
        col_delta: i64::from(col_delta),
    };
    beds_response("bed_resize", dispatch(&FrostInput::default(), action))
}

/// Plants one square.
///
/// # FFI contract
/// - `date = None` derives the date from `frost.spring` and the plant's
///   spring offset.
/// - Unknown plant names are added to the library with default traits.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_assign(
    bed: String,
    row: u32,
    col: u32,
    plant: String,
    date: Option<String>,
    frost: FrostInput,
) -> BedsResponse {
    let action = Action::AssignPlant {
        bed,
        row: to_index(row),
        col: to_index(col),
        plant,
        date,
    };
    beds_response("bed_assign", dispatch(&frost, action))
}

#[flutter_rust_bridge::frb(sync)]
pub fn bed_clear(bed: String, row: u32, col: u32) -> BedsResponse {
    let action = Action::ClearSquare {
        bed,
        row: to_index(row),
        col: to_index(col),
    };
    beds_response("bed_clear", dispatch(&FrostInput::default(), action))
}

/// Replaces the note on a planted square.
#[flutter_rust_bridge::frb(sync)]
pub fn bed_set_note(bed: String, row: u32, col: u32, note: String) -> BedsResponse {
    let action = Action::SetSquareNote {
        bed,
        row: to_index(row),
        col: to_index(col),
        note,
    };
    beds_response("bed_set_note", dispatch(&FrostInput::default(), action))
}

/// Lists the plant library in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_list() -> PlantsResponse {
    plants_response(
        "plant_list",
        with_planner(&FrostInput::default(), |_| Ok(())),
    )
}

/// Adds a default trait. Defaults to `New Plant`, suffixed when taken.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_add(name: Option<String>) -> PlantsResponse {
    plants_response(
        "plant_add",
        dispatch(&FrostInput::default(), Action::AddPlant { name }),
    )
}

/// Edits one trait in place. Planted squares keep the name they were
/// assigned with.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_update(name: String, edit: PlantEditInput) -> PlantsResponse {
    let update = match to_plant_update(edit) {
        Ok(update) => update,
        Err(message) => {
            return PlantsResponse {
                ok: false,
                message: format!("plant_update failed: {message}"),
                error_code: Some("invalid_start_method".to_string()),
                plants: Vec::new(),
            };
        }
    };
    plants_response(
        "plant_update",
        dispatch(&FrostInput::default(), Action::UpdatePlant { name, update }),
    )
}

/// Projects outdoor and indoor-start events, optionally with successions
/// before `frost.fall`.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_list(include_successions: bool, frost: FrostInput) -> CalendarResponse {
    let result = with_planner(&frost, |planner| {
        Ok(if include_successions {
            planner.calendar_with_successions()
        } else {
            planner.calendar()
        })
    });
    match result {
        Ok((calendar, _)) => {
            let days = to_calendar_days(&calendar);
            let message = if days.is_empty() {
                "No planting events.".to_string()
            } else {
                format!("{} event(s) on {} day(s).", calendar.event_count(), days.len())
            };
            CalendarResponse {
                ok: true,
                message,
                days,
            }
        }
        Err(err) => CalendarResponse {
            ok: false,
            message: format!("calendar_list failed: {err}"),
            days: Vec::new(),
        },
    }
}

fn dispatch(
    frost: &FrostInput,
    action: Action,
) -> Result<((), GardenState), PlannerError> {
    with_planner(frost, |planner| {
        planner.dispatch(action)?;
        Ok(())
    })
}

/// Runs `f` against a freshly loaded planner and returns its result with the
/// resulting state.
fn with_planner<T>(
    frost: &FrostInput,
    f: impl FnOnce(&mut SqlitePlanner<'_>) -> Result<T, PlannerError>,
) -> Result<(T, GardenState), PlannerError> {
    let _guard = PLANNER_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let db_path = resolve_planner_db_path();
    let conn = open_db(&db_path)?;
    let mut planner = PlannerService::open(&conn, FrostDates::current_year())?;
    if frost.spring.is_some() || frost.fall.is_some() {
        planner.dispatch(Action::SetFrostDates {
            spring: frost.spring.clone(),
            fall: frost.fall.clone(),
        })?;
    }
    let value = f(&mut planner)?;
    Ok((value, planner.into_state()))
}

fn resolve_planner_db_path() -> PathBuf {
    PLANNER_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(PLANNER_DB_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(PLANNER_DB_FILE_NAME)
        })
        .clone()
}

fn beds_response(
    operation: &str,
    result: Result<((), GardenState), PlannerError>,
) -> BedsResponse {
    match result {
        Ok(((), state)) => BedsResponse {
            ok: true,
            message: format!("{} bed(s).", state.beds().len()),
            error_code: None,
            beds: state.beds().iter().map(to_bed_item).collect(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error operation={operation}");
            BedsResponse {
                ok: false,
                message: format!("{operation} failed: {err}"),
                error_code: Some(error_code(&err).to_string()),
                beds: Vec::new(),
            }
        }
    }
}

fn plants_response(
    operation: &str,
    result: Result<((), GardenState), PlannerError>,
) -> PlantsResponse {
    match result {
        Ok(((), state)) => PlantsResponse {
            ok: true,
            message: format!("{} plant(s).", state.plants().len()),
            error_code: None,
            plants: state.plants().iter().map(to_plant_item).collect(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error operation={operation}");
            PlantsResponse {
                ok: false,
                message: format!("{operation} failed: {err}"),
                error_code: Some(error_code(&err).to_string()),
                plants: Vec::new(),
            }
        }
    }
}

fn error_code(err: &PlannerError) -> &'static str {
    match err {
        PlannerError::Rejected(action_err) => action_err.code(),
        PlannerError::Repo(_) => "storage",
    }
}

fn to_plant_update(edit: PlantEditInput) -> Result<PlantUpdate, String> {
    let start_method = match edit.start_method.as_deref() {
        Some(raw) => Some(
            StartMethod::parse(raw)
                .ok_or_else(|| format!("unsupported start method `{}`", raw.trim()))?,
        ),
        None => None,
    };
    let indoor_offset = if edit.clear_indoor_offset {
        Some(None)
    } else {
        edit.indoor_offset.map(Some)
    };
    Ok(PlantUpdate {
        name: edit.name,
        days_to_maturity: edit.days_to_maturity,
        spring_offset: edit.spring_offset,
        indoor_offset,
        start_method,
        succession: edit.succession,
        replant_delay: edit.replant_delay,
        notes: edit.notes,
    })
}

fn to_bed_item(bed: &Bed) -> BedItem {
    BedItem {
        name: bed.name().to_string(),
        rows: to_u32(bed.rows()),
        cols: to_u32(bed.cols()),
        cells: bed
            .planted_cells()
            .map(|(row, col, record)| BedCellItem {
                row: to_u32(row),
                col: to_u32(col),
                plant: record.plant.clone(),
                date: record.date.clone(),
                display_date: format_display(&record.date),
                note: record.note.clone(),
            })
            .collect(),
    }
}

fn to_plant_item(plant: &PlantTrait) -> PlantItem {
    PlantItem {
        name: plant.name.clone(),
        days_to_maturity: plant.days_to_maturity,
        spring_offset: plant.spring_offset,
        indoor_offset: plant.indoor_offset,
        start_method: plant.start_method.as_str().to_string(),
        succession: plant.succession,
        replant_delay: plant.replant_delay,
        notes: plant.notes.clone(),
    }
}

fn to_calendar_days(calendar: &Calendar) -> Vec<CalendarDayItem> {
    calendar
        .iter()
        .map(|(date, events)| {
            let date = to_canonical(date);
            CalendarDayItem {
                display_date: format_display(&date),
                date,
                events: events
                    .iter()
                    .map(|event| CalendarEventItem {
                        kind: event.kind.label().to_string(),
                        plant: event.plant.clone(),
                        bed: event.bed.clone(),
                        description: event.description(),
                    })
                    .collect(),
            }
        })
        .collect()
}

fn to_index(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        bed_add, bed_assign, bed_clear, bed_delete, bed_list, bed_resize, bed_set_note,
        calendar_list, core_version, init_logging, ping, plant_add, plant_list, plant_update,
        FrostInput, PlantEditInput,
    };
    use garden_core::db::open_db;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn bed_assign_persists_square_and_projects_calendar() {
        let name = unique_token("bed-assign");
        let added = bed_add(Some(name.clone()), Some(2), Some(2));
        assert!(added.ok, "{}", added.message);

        let assigned = bed_assign(
            name.clone(),
            0,
            1,
            "Tomato".to_string(),
            Some("2024-05-15".to_string()),
            FrostInput::default(),
        );
        assert!(assigned.ok, "{}", assigned.message);
        let bed = assigned
            .beds
            .iter()
            .find(|bed| bed.name == name)
            .expect("bed should be listed");
        assert_eq!(bed.cells.len(), 1);
        assert_eq!(bed.cells[0].display_date, "May 15");

        let conn = open_db(super::resolve_planner_db_path()).expect("open db");
        let stored: String = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = 'beds'",
                [],
                |row| row.get(0),
            )
            .expect("beds entry");
        assert!(stored.contains(&name));

        let calendar = calendar_list(false, FrostInput::default());
        assert!(calendar.ok, "{}", calendar.message);
        let indoor_day = calendar
            .days
            .iter()
            .find(|day| day.date == "2024-03-20")
            .expect("indoor start day");
        assert!(indoor_day
            .events
            .iter()
            .any(|event| event.bed == name && event.kind == "indoors"));
    }

    #[test]
    fn bed_assign_without_date_uses_supplied_spring_frost() {
        let name = unique_token("bed-frost");
        assert!(bed_add(Some(name.clone()), Some(1), Some(1)).ok);

        let frost = FrostInput {
            spring: Some("2024-05-10".to_string()),
            fall: None,
        };
        let assigned = bed_assign(name.clone(), 0, 0, "Carrot".to_string(), None, frost);
        assert!(assigned.ok, "{}", assigned.message);
        let bed = assigned.beds.iter().find(|bed| bed.name == name).unwrap();
        assert_eq!(bed.cells[0].date, "2024-04-26");

        let noted = bed_set_note(name.clone(), 0, 0, "thin to 2in".to_string());
        assert!(noted.ok, "{}", noted.message);
        let bed = noted.beds.iter().find(|bed| bed.name == name).unwrap();
        assert_eq!(bed.cells[0].note, "thin to 2in");

        let cleared = bed_clear(name.clone(), 0, 0);
        let bed = cleared.beds.iter().find(|bed| bed.name == name).unwrap();
        assert!(bed.cells.is_empty());

        assert!(bed_delete(name).ok);
    }

    #[test]
    fn rejected_calls_return_error_codes() {
        let missing = unique_token("missing-bed");
        let resized = bed_resize(missing.clone(), 1, 0);
        assert!(!resized.ok);
        assert_eq!(resized.error_code.as_deref(), Some("unknown_bed"));
        assert!(resized.message.contains(&missing));

        let invalid_frost = bed_assign(
            "Main Bed".to_string(),
            0,
            0,
            "Tomato".to_string(),
            None,
            FrostInput {
                spring: Some("not-a-date".to_string()),
                fall: None,
            },
        );
        assert!(!invalid_frost.ok);
        assert_eq!(invalid_frost.error_code.as_deref(), Some("invalid_date"));
        assert!(bed_list().ok);
    }

    #[test]
    fn oversized_bed_add_is_rejected_with_error_code() {
        let name = unique_token("bed-huge");
        let added = bed_add(Some(name.clone()), Some(u32::MAX), Some(u32::MAX));
        assert!(!added.ok);
        assert_eq!(added.error_code.as_deref(), Some("dimensions_too_large"));
        assert!(!bed_list().beds.iter().any(|bed| bed.name == name));
    }

    #[test]
    fn plant_add_and_update_round_trip_through_library() {
        let base = unique_token("Pepper");
        let added = plant_add(Some(base.clone()));
        assert!(added.ok, "{}", added.message);
        assert!(added.plants.iter().any(|plant| plant.name == base));

        let updated = plant_update(
            base.clone(),
            PlantEditInput {
                days_to_maturity: Some(80),
                indoor_offset: Some(-56),
                start_method: Some("indoor".to_string()),
                ..PlantEditInput::default()
            },
        );
        assert!(updated.ok, "{}", updated.message);
        let pepper = updated
            .plants
            .iter()
            .find(|plant| plant.name == base)
            .expect("updated plant");
        assert_eq!(pepper.days_to_maturity, 80);
        assert_eq!(pepper.indoor_offset, Some(-56));
        assert_eq!(pepper.start_method, "indoor");

        let rejected = plant_update(
            base.clone(),
            PlantEditInput {
                start_method: Some("greenhouse".to_string()),
                ..PlantEditInput::default()
            },
        );
        assert!(!rejected.ok);
        assert_eq!(rejected.error_code.as_deref(), Some("invalid_start_method"));

        let invalid = plant_update(
            base.clone(),
            PlantEditInput {
                days_to_maturity: Some(0),
                ..PlantEditInput::default()
            },
        );
        assert!(!invalid.ok);
        assert!(plant_list().plants.iter().any(|plant| plant.name == base));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
