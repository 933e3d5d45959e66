//! Planting bed grid model.
//!
//! # Responsibility
//! - Represent a named rectangular grid of optional planting records.
//! - Provide shape-preserving resize and cell access helpers.
//!
//! # Invariants
//! - A bed has between 1 and `MAX_BED_DIM` rows and columns.
//! - Bed names carry no leading or trailing whitespace.
//! - Every row has the same length.
//! - Resizing keeps cells inside the overlapping region untouched.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Size of a bed created without explicit dimensions.
pub const NEW_BED_ROWS: usize = 3;
pub const NEW_BED_COLS: usize = 6;
/// Base name used for beds created without a name.
pub const NEW_BED_NAME: &str = "New Bed";
/// Largest accepted row or column count.
pub const MAX_BED_DIM: usize = 100;

/// One grid row.
pub type GridRow = Vec<Option<PlantingRecord>>;

/// Content of a planted square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingRecord {
    /// Soft reference to `PlantTrait::name`.
    pub plant: String,
    /// Outdoor planting date, `YYYY-MM-DD`.
    pub date: String,
    /// Snapshot of the trait maturity at assignment time; 0 when unknown.
    #[serde(default)]
    pub days_to_maturity: i32,
    #[serde(default)]
    pub note: String,
}

impl PlantingRecord {
    pub fn new(plant: impl Into<String>, date: impl Into<String>, days_to_maturity: i32) -> Self {
        Self {
            plant: plant.into(),
            date: date.into(),
            days_to_maturity,
            note: String::new(),
        }
    }
}

/// Grid shape errors raised when building a bed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridShapeError {
    ZeroDimension { rows: usize, cols: usize },
    /// A dimension exceeds [`MAX_BED_DIM`].
    TooLarge { max: usize },
    RaggedRow { row: usize, expected: usize, found: usize },
}

impl Display for GridShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension { rows, cols } => {
                write!(f, "bed must be at least 1x1, got {rows}x{cols}")
            }
            Self::TooLarge { max } => {
                write!(f, "bed dimensions must not exceed {max}x{max}")
            }
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "bed row {row} has {found} cells, expected {expected}"
            ),
        }
    }
}

impl Error for GridShapeError {}

/// Named rectangular planting grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBed")]
pub struct Bed {
    name: String,
    grid: Vec<GridRow>,
}

#[derive(Deserialize)]
struct StoredBed {
    name: String,
    grid: Vec<GridRow>,
}

impl TryFrom<StoredBed> for Bed {
    type Error = GridShapeError;

    fn try_from(value: StoredBed) -> Result<Self, Self::Error> {
        Self::from_grid(value.name, value.grid)
    }
}

impl Bed {
    /// Creates an empty `rows x cols` bed.
    pub fn new(name: impl AsRef<str>, rows: usize, cols: usize) -> Result<Self, GridShapeError> {
        let (rows, cols) = check_dimensions(to_signed(rows), to_signed(cols))?;
        Ok(Self {
            name: name.as_ref().trim().to_string(),
            grid: empty_grid(rows, cols),
        })
    }

    /// Wraps an existing grid after checking its shape.
    pub fn from_grid(name: impl AsRef<str>, grid: Vec<GridRow>) -> Result<Self, GridShapeError> {
        let (_, cols) = check_dimensions(
            to_signed(grid.len()),
            to_signed(grid.first().map_or(0, Vec::len)),
        )?;
        if let Some((row, found)) = grid
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != cols)
        {
            return Err(GridShapeError::RaggedRow {
                row,
                expected: cols,
                found,
            });
        }
        Ok(Self {
            name: name.as_ref().trim().to_string(),
            grid,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    pub fn cols(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn grid(&self) -> &[GridRow] {
        &self.grid
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols()
    }

    /// Returns the record at `(row, col)`; `None` for empty or out-of-range cells.
    pub fn get(&self, row: usize, col: usize) -> Option<&PlantingRecord> {
        self.grid.get(row)?.get(col)?.as_ref()
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Option<PlantingRecord>> {
        self.grid.get_mut(row)?.get_mut(col)
    }

    /// Iterates planted cells in row-major order.
    pub fn planted_cells(&self) -> impl Iterator<Item = (usize, usize, &PlantingRecord)> {
        self.grid.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.as_ref().map(|record| (row, col, record)))
        })
    }

    pub fn planted_count(&self) -> usize {
        self.planted_cells().count()
    }

    /// Returns a copy grown/shrunk by the given deltas.
    ///
    /// # Errors
    /// - `ZeroDimension` when a dimension would drop below 1.
    /// - `TooLarge` when a dimension would exceed [`MAX_BED_DIM`].
    pub fn resized(&self, row_delta: i64, col_delta: i64) -> Result<Self, GridShapeError> {
        let (rows, cols) = check_dimensions(
            to_signed(self.rows()).saturating_add(row_delta),
            to_signed(self.cols()).saturating_add(col_delta),
        )?;

        let grid = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| self.grid.get(row).and_then(|cells| cells.get(col)).cloned().flatten())
                    .collect()
            })
            .collect();

        Ok(Self {
            name: self.name.clone(),
            grid,
        })
    }
}

fn to_signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn check_dimensions(rows: i64, cols: i64) -> Result<(usize, usize), GridShapeError> {
    if rows < 1 || cols < 1 {
        return Err(GridShapeError::ZeroDimension {
            rows: usize::try_from(rows).unwrap_or(0),
            cols: usize::try_from(cols).unwrap_or(0),
        });
    }
    match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(rows), Ok(cols)) if rows <= MAX_BED_DIM && cols <= MAX_BED_DIM => Ok((rows, cols)),
        _ => Err(GridShapeError::TooLarge { max: MAX_BED_DIM }),
    }
}

fn empty_grid(rows: usize, cols: usize) -> Vec<GridRow> {
    vec![vec![None; cols]; rows]
}

#[cfg(test)]
mod tests {
    use super::{Bed, GridShapeError, PlantingRecord, MAX_BED_DIM};

    fn planted_bed() -> Bed {
        let mut bed = Bed::new("Main Bed", 3, 8).expect("valid bed");
        *bed.cell_mut(0, 0).expect("in range") =
            Some(PlantingRecord::new("Tomato", "2024-05-15", 75));
        *bed.cell_mut(2, 7).expect("in range") =
            Some(PlantingRecord::new("Carrot", "2024-04-16", 70));
        bed
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            Bed::new("x", 0, 3),
            Err(GridShapeError::ZeroDimension { rows: 0, cols: 3 })
        ));
    }

    #[test]
    fn from_grid_rejects_ragged_rows() {
        let grid = vec![vec![None, None], vec![None]];
        let err = Bed::from_grid("x", grid).expect_err("ragged grid");
        assert_eq!(
            err,
            GridShapeError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn resize_preserves_overlap_and_fills_empty() {
        let bed = planted_bed();
        let grown = bed.resized(1, 2).expect("grow");
        assert_eq!((grown.rows(), grown.cols()), (4, 10));
        assert_eq!(grown.get(0, 0), bed.get(0, 0));
        assert_eq!(grown.get(2, 7), bed.get(2, 7));
        assert!(grown.get(3, 9).is_none());
        assert_eq!(grown.planted_count(), 2);

        let shrunk = bed.resized(-1, -1).expect("shrink");
        assert_eq!((shrunk.rows(), shrunk.cols()), (2, 7));
        assert_eq!(shrunk.planted_count(), 1);
    }

    #[test]
    fn resize_then_inverse_restores_contents() {
        let bed = planted_bed();
        let restored = bed
            .resized(2, 3)
            .and_then(|grown| grown.resized(-2, -3))
            .expect("resize roundtrip");
        assert_eq!(restored, bed);
    }

    #[test]
    fn resize_below_one_is_rejected() {
        let bed = Bed::new("tiny", 1, 1).expect("valid bed");
        assert!(matches!(
            bed.resized(-1, 0),
            Err(GridShapeError::ZeroDimension { rows: 0, cols: 1 })
        ));
        assert!(matches!(
            bed.resized(0, i64::MIN),
            Err(GridShapeError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn oversized_dimensions_are_rejected_without_allocating() {
        let too_large = Err(GridShapeError::TooLarge { max: MAX_BED_DIM });
        assert_eq!(Bed::new("huge", usize::MAX, 1), too_large);
        assert_eq!(Bed::new("huge", 1, MAX_BED_DIM + 1), too_large);
        assert!(Bed::new("edge", MAX_BED_DIM, MAX_BED_DIM).is_ok());

        let bed = Bed::new("tiny", 1, 1).expect("valid bed");
        assert_eq!(bed.resized(i64::MAX, 0), too_large);
        assert_eq!(bed.resized(0, 1 << 40), too_large);
    }

    #[test]
    fn names_are_trimmed_on_construction_and_decode() {
        assert_eq!(Bed::new("  Herbs ", 1, 1).expect("bed").name(), "Herbs");
        let decoded: Bed =
            serde_json::from_str(r#"{"name":" Herbs ","grid":[[null]]}"#).expect("decodes");
        assert_eq!(decoded.name(), "Herbs");
    }

    #[test]
    fn planted_cells_are_row_major() {
        let bed = planted_bed();
        let positions = bed
            .planted_cells()
            .map(|(row, col, record)| (row, col, record.plant.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![(0, 0, "Tomato"), (2, 7, "Carrot")]);
    }
}
