//! Reducer-style planner actions.
//!
//! # Responsibility
//! - Describe every user-level mutation as an [`Action`] value.
//! - Apply actions to a copy of [`GardenState`] and return the new state.
//!
//! # Invariants
//! - `apply` never mutates its input; a rejected action leaves no trace.
//! - At least one bed exists after every successful action.
//! - Assigned records store normalized plant names and canonical dates.
//! - Assigning an unknown plant creates its default trait first.

use crate::model::bed::{
    Bed, GridShapeError, PlantingRecord, NEW_BED_COLS, NEW_BED_NAME, NEW_BED_ROWS,
};
use crate::model::plant::{
    normalize_plant_name, PlantTrait, PlantUpdate, PlantValidationError, NEW_PLANT_NAME,
};
use crate::model::state::GardenState;
use crate::schedule::date::{parse_date, shift_days, to_canonical};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One user-level state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replaces the given frost reference dates.
    SetFrostDates {
        spring: Option<String>,
        fall: Option<String>,
    },
    /// Adds an empty bed. Defaults: `New Bed N`, 3 x 6.
    AddBed {
        name: Option<String>,
        rows: Option<usize>,
        cols: Option<usize>,
    },
    RenameBed {
        from: String,
        to: String,
    },
    /// Removes a bed unless it is the last one.
    DeleteBed {
        bed: String,
    },
    /// Grows or shrinks a bed; both dimensions must stay >= 1.
    ResizeBed {
        bed: String,
        row_delta: i64,
        col_delta: i64,
    },
    /// Plants `plant` in one cell. A missing `date` resolves to the spring
    /// frost date shifted by the plant's spring offset.
    AssignPlant {
        bed: String,
        row: usize,
        col: usize,
        plant: String,
        date: Option<String>,
    },
    ClearSquare {
        bed: String,
        row: usize,
        col: usize,
    },
    SetSquareNote {
        bed: String,
        row: usize,
        col: usize,
        note: String,
    },
    /// Adds a default trait. Defaults to `New Plant` (suffixed when taken).
    AddPlant {
        name: Option<String>,
    },
    UpdatePlant {
        name: String,
        update: PlantUpdate,
    },
}

impl Action {
    /// Stable action name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFrostDates { .. } => "set_frost_dates",
            Self::AddBed { .. } => "add_bed",
            Self::RenameBed { .. } => "rename_bed",
            Self::DeleteBed { .. } => "delete_bed",
            Self::ResizeBed { .. } => "resize_bed",
            Self::AssignPlant { .. } => "assign_plant",
            Self::ClearSquare { .. } => "clear_square",
            Self::SetSquareNote { .. } => "set_square_note",
            Self::AddPlant { .. } => "add_plant",
            Self::UpdatePlant { .. } => "update_plant",
        }
    }
}

/// Reasons an action is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    UnknownBed(String),
    CellOutOfRange {
        bed: String,
        row: usize,
        col: usize,
    },
    /// Target cell has no planting record.
    EmptyCell {
        bed: String,
        row: usize,
        col: usize,
    },
    EmptyPlantName,
    UnknownPlant(String),
    DuplicatePlantName(String),
    InvalidPlant(PlantValidationError),
    /// Input date does not parse.
    InvalidDate(String),
    /// No planting date could be derived for the plant.
    UnresolvedDate(String),
    BlankBedName,
    DuplicateBedName(String),
    LastBed(String),
    InvalidDimensions {
        rows: usize,
        cols: usize,
    },
    ResizeBelowMinimum {
        bed: String,
        row_delta: i64,
        col_delta: i64,
    },
    /// A bed dimension would exceed the supported maximum.
    DimensionsTooLarge {
        bed: String,
        max: usize,
    },
}

impl ActionError {
    /// Stable, payload-free error code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownBed(_) => "unknown_bed",
            Self::CellOutOfRange { .. } => "cell_out_of_range",
            Self::EmptyCell { .. } => "empty_cell",
            Self::EmptyPlantName => "empty_plant_name",
            Self::UnknownPlant(_) => "unknown_plant",
            Self::DuplicatePlantName(_) => "duplicate_plant_name",
            Self::InvalidPlant(_) => "invalid_plant",
            Self::InvalidDate(_) => "invalid_date",
            Self::UnresolvedDate(_) => "unresolved_date",
            Self::BlankBedName => "blank_bed_name",
            Self::DuplicateBedName(_) => "duplicate_bed_name",
            Self::LastBed(_) => "last_bed",
            Self::InvalidDimensions { .. } => "invalid_dimensions",
            Self::ResizeBelowMinimum { .. } => "resize_below_minimum",
            Self::DimensionsTooLarge { .. } => "dimensions_too_large",
        }
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBed(name) => write!(f, "bed not found: `{name}`"),
            Self::CellOutOfRange { bed, row, col } => {
                write!(f, "square ({row}, {col}) is outside bed `{bed}`")
            }
            Self::EmptyCell { bed, row, col } => {
                write!(f, "square ({row}, {col}) in bed `{bed}` is empty")
            }
            Self::EmptyPlantName => write!(f, "plant name must not be blank"),
            Self::UnknownPlant(name) => write!(f, "plant not found: `{name}`"),
            Self::DuplicatePlantName(name) => write!(f, "plant already exists: `{name}`"),
            Self::InvalidPlant(err) => write!(f, "{err}"),
            Self::InvalidDate(value) => write!(f, "invalid date: `{value}`"),
            Self::UnresolvedDate(plant) => {
                write!(f, "could not derive a planting date for `{plant}`")
            }
            Self::BlankBedName => write!(f, "bed name must not be blank"),
            Self::DuplicateBedName(name) => write!(f, "bed already exists: `{name}`"),
            Self::LastBed(name) => write!(f, "cannot delete `{name}`: at least one bed must remain"),
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "bed must be at least 1x1, got {rows}x{cols}")
            }
            Self::ResizeBelowMinimum {
                bed,
                row_delta,
                col_delta,
            } => write!(
                f,
                "resizing `{bed}` by ({row_delta}, {col_delta}) would leave it smaller than 1x1"
            ),
            Self::DimensionsTooLarge { bed, max } => {
                write!(f, "bed `{bed}` cannot be larger than {max}x{max}")
            }
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPlant(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlantValidationError> for ActionError {
    fn from(value: PlantValidationError) -> Self {
        Self::InvalidPlant(value)
    }
}

impl GardenState {
    /// Applies `action` and returns the resulting state.
    ///
    /// # Errors
    /// Returns the rejection reason; `self` is unchanged either way.
    pub fn apply(&self, action: &Action) -> Result<GardenState, ActionError> {
        let mut next = self.clone();
        match action {
            Action::SetFrostDates { spring, fall } => {
                set_frost_dates(&mut next, spring.as_deref(), fall.as_deref())?
            }
            Action::AddBed { name, rows, cols } => add_bed(&mut next, name.as_deref(), *rows, *cols)?,
            Action::RenameBed { from, to } => rename_bed(&mut next, from, to)?,
            Action::DeleteBed { bed } => delete_bed(&mut next, bed)?,
            Action::ResizeBed {
                bed,
                row_delta,
                col_delta,
            } => resize_bed(&mut next, bed, *row_delta, *col_delta)?,
            Action::AssignPlant {
                bed,
                row,
                col,
                plant,
                date,
            } => assign_plant(&mut next, bed, *row, *col, plant, date.as_deref())?,
            Action::ClearSquare { bed, row, col } => {
                *cell_slot(&mut next, bed, *row, *col)? = None;
            }
            Action::SetSquareNote {
                bed,
                row,
                col,
                note,
            } => set_square_note(&mut next, bed, *row, *col, note)?,
            Action::AddPlant { name } => add_plant(&mut next, name.as_deref())?,
            Action::UpdatePlant { name, update } => update_plant(&mut next, name, update)?,
        }
        Ok(next)
    }

    /// Default outdoor planting date for `plant`.
    ///
    /// Known plants: spring frost + `spring_offset`. Unknown plants: the
    /// spring frost date itself.
    pub fn default_planting_date(&self, plant: &str) -> Option<NaiveDate> {
        match self.plants.get(plant) {
            Some(plant) => shift_days(self.frost.spring, i64::from(plant.spring_offset)),
            None => Some(self.frost.spring),
        }
    }
}

fn parse_required(value: &str) -> Result<NaiveDate, ActionError> {
    parse_date(value).ok_or_else(|| ActionError::InvalidDate(value.to_string()))
}

fn set_frost_dates(
    state: &mut GardenState,
    spring: Option<&str>,
    fall: Option<&str>,
) -> Result<(), ActionError> {
    if let Some(value) = spring {
        state.frost.spring = parse_required(value)?;
    }
    if let Some(value) = fall {
        state.frost.fall = parse_required(value)?;
    }
    Ok(())
}

fn add_bed(
    state: &mut GardenState,
    name: Option<&str>,
    rows: Option<usize>,
    cols: Option<usize>,
) -> Result<(), ActionError> {
    let name = match name.map(str::trim) {
        Some("") => return Err(ActionError::BlankBedName),
        Some(value) => {
            if state.bed_index(value).is_some() {
                return Err(ActionError::DuplicateBedName(value.to_string()));
            }
            value.to_string()
        }
        None => unique_bed_name(state),
    };
    let rows = rows.unwrap_or(NEW_BED_ROWS);
    let cols = cols.unwrap_or(NEW_BED_COLS);
    let bed = Bed::new(&name, rows, cols).map_err(|err| match err {
        GridShapeError::TooLarge { max } => ActionError::DimensionsTooLarge { bed: name, max },
        _ => ActionError::InvalidDimensions { rows, cols },
    })?;
    state.beds.push(bed);
    Ok(())
}

fn unique_bed_name(state: &GardenState) -> String {
    let mut suffix = 1_u32;
    loop {
        let candidate = format!("{NEW_BED_NAME} {suffix}");
        if state.bed_index(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

fn rename_bed(state: &mut GardenState, from: &str, to: &str) -> Result<(), ActionError> {
    let index = bed_index(state, from)?;
    let to = to.trim();
    if to.is_empty() {
        return Err(ActionError::BlankBedName);
    }
    if state.beds[index].name() == to {
        return Ok(());
    }
    if state.bed_index(to).is_some() {
        return Err(ActionError::DuplicateBedName(to.to_string()));
    }
    state.beds[index].set_name(to.to_string());
    Ok(())
}

fn delete_bed(state: &mut GardenState, bed: &str) -> Result<(), ActionError> {
    let index = bed_index(state, bed)?;
    if state.beds.len() <= 1 {
        return Err(ActionError::LastBed(state.beds[index].name().to_string()));
    }
    state.beds.remove(index);
    Ok(())
}

fn resize_bed(
    state: &mut GardenState,
    bed: &str,
    row_delta: i64,
    col_delta: i64,
) -> Result<(), ActionError> {
    let index = bed_index(state, bed)?;
    let current = &state.beds[index];
    let resized = current
        .resized(row_delta, col_delta)
        .map_err(|err| match err {
            GridShapeError::TooLarge { max } => ActionError::DimensionsTooLarge {
                bed: current.name().to_string(),
                max,
            },
            _ => ActionError::ResizeBelowMinimum {
                bed: current.name().to_string(),
                row_delta,
                col_delta,
            },
        })?;
    state.beds[index] = resized;
    Ok(())
}

fn assign_plant(
    state: &mut GardenState,
    bed: &str,
    row: usize,
    col: usize,
    plant: &str,
    date: Option<&str>,
) -> Result<(), ActionError> {
    cell_slot(state, bed, row, col)?;

    let plant = normalize_plant_name(plant);
    if plant.is_empty() {
        return Err(ActionError::EmptyPlantName);
    }

    let planted = match date.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_required(value)?,
        None => state
            .default_planting_date(&plant)
            .ok_or_else(|| ActionError::UnresolvedDate(plant.clone()))?,
    };

    let days_to_maturity = state.plants.ensure(&plant).days_to_maturity;
    let record = PlantingRecord::new(plant, to_canonical(planted), days_to_maturity);
    *cell_slot(state, bed, row, col)? = Some(record);
    Ok(())
}

fn set_square_note(
    state: &mut GardenState,
    bed: &str,
    row: usize,
    col: usize,
    note: &str,
) -> Result<(), ActionError> {
    let bed_name = state.beds[bed_index(state, bed)?].name().to_string();
    let record = cell_slot(state, bed, row, col)?
        .as_mut()
        .ok_or(ActionError::EmptyCell {
            bed: bed_name,
            row,
            col,
        })?;
    record.note = note.trim().to_string();
    Ok(())
}

fn add_plant(state: &mut GardenState, name: Option<&str>) -> Result<(), ActionError> {
    let name = match name {
        Some(value) => {
            let normalized = normalize_plant_name(value);
            if normalized.is_empty() {
                return Err(ActionError::EmptyPlantName);
            }
            if state.plants.contains(&normalized) {
                return Err(ActionError::DuplicatePlantName(normalized));
            }
            normalized
        }
        None => state.plants.unique_name(NEW_PLANT_NAME),
    };
    state.plants.push(PlantTrait::with_defaults(name));
    Ok(())
}

fn update_plant(
    state: &mut GardenState,
    name: &str,
    update: &PlantUpdate,
) -> Result<(), ActionError> {
    let current = state
        .plants
        .get(name)
        .cloned()
        .ok_or_else(|| ActionError::UnknownPlant(normalize_plant_name(name)))?;
    let edited = update.applied_to(&current);
    edited.validate()?;
    if edited.name != current.name && state.plants.contains(&edited.name) {
        return Err(ActionError::DuplicatePlantName(edited.name));
    }
    state.plants.replace(&current.name, edited);
    Ok(())
}

fn bed_index(state: &GardenState, bed: &str) -> Result<usize, ActionError> {
    state
        .bed_index(bed)
        .ok_or_else(|| ActionError::UnknownBed(bed.trim().to_string()))
}

fn cell_slot<'a>(
    state: &'a mut GardenState,
    bed: &str,
    row: usize,
    col: usize,
) -> Result<&'a mut Option<PlantingRecord>, ActionError> {
    let index = bed_index(state, bed)?;
    let target = &mut state.beds[index];
    let bed_name = target.name().to_string();
    target
        .cell_mut(row, col)
        .ok_or(ActionError::CellOutOfRange {
            bed: bed_name,
            row,
            col,
        })
}
