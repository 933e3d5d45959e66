//! Plant trait library model.
//!
//! # Responsibility
//! - Define the agronomic traits used to schedule plantings.
//! - Provide name-keyed lookup over the ordered plant library.
//!
//! # Invariants
//! - Plant names are normalized (trimmed, single-spaced) and unique.
//! - `days_to_maturity > 0` and `replant_delay >= 0` for validated traits.
//! - Traits are never hard-deleted; edits happen in place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Maturity used for traits created implicitly by an assignment.
pub const DEFAULT_DAYS_TO_MATURITY: i32 = 60;
/// Base name used by "add plant".
pub const NEW_PLANT_NAME: &str = "New Plant";

/// How seedlings are started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMethod {
    /// Started indoors and transplanted; eligible for indoor-start events.
    Indoor,
    /// Sown directly in the bed.
    #[default]
    Outdoor,
}

impl StartMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indoor => "indoor",
            Self::Outdoor => "outdoor",
        }
    }

    /// Parses `indoor` / `outdoor`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indoor" | "indoors" => Some(Self::Indoor),
            "outdoor" | "outdoors" => Some(Self::Outdoor),
            _ => None,
        }
    }
}

/// Agronomic traits for one plant species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredPlantTrait")]
pub struct PlantTrait {
    /// Unique library key.
    pub name: String,
    pub days_to_maturity: i32,
    /// Days relative to the spring frost date; negative means before.
    pub spring_offset: i32,
    /// Days relative to the outdoor planting date. `None` = direct-sow only.
    pub indoor_offset: Option<i32>,
    pub start_method: StartMethod,
    /// Whether the crop is re-sown after each harvest.
    pub succession: bool,
    /// Days between harvest and the next sowing.
    pub replant_delay: i32,
    pub notes: String,
}

impl PlantTrait {
    /// Creates a trait with the defaults used for unknown plants.
    ///
    /// Maturity 60 days, zero spring offset, direct-sow, no succession.
    pub fn with_defaults(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_plant_name(name.as_ref()),
            days_to_maturity: DEFAULT_DAYS_TO_MATURITY,
            spring_offset: 0,
            indoor_offset: None,
            start_method: StartMethod::Outdoor,
            succession: false,
            replant_delay: 0,
            notes: String::new(),
        }
    }

    /// Validates trait invariants before the trait enters the library.
    pub fn validate(&self) -> Result<(), PlantValidationError> {
        if self.name.trim().is_empty() {
            return Err(PlantValidationError::EmptyName);
        }
        if self.days_to_maturity <= 0 {
            return Err(PlantValidationError::NonPositiveMaturity(
                self.days_to_maturity,
            ));
        }
        if self.replant_delay < 0 {
            return Err(PlantValidationError::NegativeReplantDelay(
                self.replant_delay,
            ));
        }
        Ok(())
    }

    /// Normalizes the name and clamps out-of-range numbers to defaults.
    ///
    /// Returns `None` when the name is blank.
    fn repaired(mut self) -> Option<Self> {
        self.name = normalize_plant_name(&self.name);
        if self.name.is_empty() {
            return None;
        }
        if self.days_to_maturity <= 0 {
            self.days_to_maturity = DEFAULT_DAYS_TO_MATURITY;
        }
        self.replant_delay = self.replant_delay.max(0);
        Some(self)
    }

    /// Returns the indoor-start offset when this plant is started indoors.
    pub fn indoor_start_offset(&self) -> Option<i32> {
        match self.start_method {
            StartMethod::Indoor => self.indoor_offset,
            StartMethod::Outdoor => None,
        }
    }

    /// Length of one sow-to-resow cycle in days.
    pub fn cycle_days(&self) -> i64 {
        i64::from(self.days_to_maturity) + i64::from(self.replant_delay)
    }
}

/// Validation errors for [`PlantTrait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantValidationError {
    EmptyName,
    NonPositiveMaturity(i32),
    NegativeReplantDelay(i32),
}

impl Display for PlantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "plant name must not be blank"),
            Self::NonPositiveMaturity(days) => {
                write!(f, "days to maturity must be positive, got {days}")
            }
            Self::NegativeReplantDelay(days) => {
                write!(f, "replant delay must not be negative, got {days}")
            }
        }
    }
}

impl Error for PlantValidationError {}

/// Persisted trait shape, tolerant of older snapshots.
///
/// Older snapshots use `days` instead of `daysToMaturity` and may omit the
/// start method, succession fields and notes.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPlantTrait {
    name: String,
    #[serde(alias = "days")]
    days_to_maturity: i32,
    #[serde(default)]
    spring_offset: i32,
    #[serde(default)]
    indoor_offset: Option<i32>,
    #[serde(default)]
    start_method: Option<StartMethod>,
    #[serde(default)]
    succession: bool,
    #[serde(default)]
    replant_delay: i32,
    #[serde(default)]
    notes: String,
}

impl From<StoredPlantTrait> for PlantTrait {
    fn from(value: StoredPlantTrait) -> Self {
        let start_method = value.start_method.unwrap_or(match value.indoor_offset {
            Some(_) => StartMethod::Indoor,
            None => StartMethod::Outdoor,
        });
        Self {
            name: normalize_plant_name(&value.name),
            days_to_maturity: value.days_to_maturity,
            spring_offset: value.spring_offset,
            indoor_offset: value.indoor_offset,
            start_method,
            succession: value.succession,
            replant_delay: value.replant_delay,
            notes: value.notes,
        }
    }
}

/// Partial edit applied by the library editor.
///
/// `None` leaves a field unchanged. `indoor_offset: Some(None)` clears the
/// offset (direct-sow only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantUpdate {
    pub name: Option<String>,
    pub days_to_maturity: Option<i32>,
    pub spring_offset: Option<i32>,
    pub indoor_offset: Option<Option<i32>>,
    pub start_method: Option<StartMethod>,
    pub succession: Option<bool>,
    pub replant_delay: Option<i32>,
    pub notes: Option<String>,
}

impl PlantUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the edit to a copy of `plant` and returns it.
    pub fn applied_to(&self, plant: &PlantTrait) -> PlantTrait {
        let mut next = plant.clone();
        if let Some(name) = &self.name {
            next.name = normalize_plant_name(name);
        }
        if let Some(days) = self.days_to_maturity {
            next.days_to_maturity = days;
        }
        if let Some(offset) = self.spring_offset {
            next.spring_offset = offset;
        }
        if let Some(offset) = self.indoor_offset {
            next.indoor_offset = offset;
        }
        if let Some(method) = self.start_method {
            next.start_method = method;
        }
        if let Some(succession) = self.succession {
            next.succession = succession;
        }
        if let Some(delay) = self.replant_delay {
            next.replant_delay = delay;
        }
        if let Some(notes) = &self.notes {
            next.notes = notes.clone();
        }
        next
    }
}

/// Ordered, name-keyed plant trait library.
///
/// Decoding goes through [`PlantLibrary::new`], so stored libraries obey the
/// same invariants as built ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PlantTrait>", into = "Vec<PlantTrait>")]
pub struct PlantLibrary {
    plants: Vec<PlantTrait>,
}

impl From<Vec<PlantTrait>> for PlantLibrary {
    fn from(plants: Vec<PlantTrait>) -> Self {
        Self::new(plants)
    }
}

impl From<PlantLibrary> for Vec<PlantTrait> {
    fn from(library: PlantLibrary) -> Self {
        library.plants
    }
}

impl PlantLibrary {
    /// Builds a library from raw traits.
    ///
    /// Names are normalized and the first trait wins for each duplicated
    /// name. Blank names are dropped. Non-positive maturity falls back to
    /// [`DEFAULT_DAYS_TO_MATURITY`] and a negative replant delay to zero.
    pub fn new(plants: Vec<PlantTrait>) -> Self {
        let mut library = Self { plants: Vec::new() };
        for plant in plants.into_iter().filter_map(PlantTrait::repaired) {
            if !library.contains(&plant.name) {
                library.plants.push(plant);
            }
        }
        library
    }

    /// Built-in seed library used when no snapshot is available.
    pub fn seeded() -> Self {
        Self::new(default_plants())
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantTrait> {
        self.plants.iter()
    }

    pub fn as_slice(&self) -> &[PlantTrait] {
        &self.plants
    }

    /// Resolves a soft reference by name.
    ///
    /// Returns `None` for names missing from the library; callers fall back
    /// to outdoor-only behavior for such references.
    pub fn get(&self, name: &str) -> Option<&PlantTrait> {
        let normalized = normalize_plant_name(name);
        self.plants.iter().find(|plant| plant.name == normalized)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the trait for `name`, creating a default entry when missing.
    pub fn ensure(&mut self, name: &str) -> &PlantTrait {
        let normalized = normalize_plant_name(name);
        let index = match self.position(&normalized) {
            Some(index) => index,
            None => {
                self.plants.push(PlantTrait::with_defaults(&normalized));
                self.plants.len() - 1
            }
        };
        &self.plants[index]
    }

    /// Returns `base`, or `base N` with the smallest free `N >= 2`.
    pub fn unique_name(&self, base: &str) -> String {
        let base = normalize_plant_name(base);
        if !self.contains(&base) {
            return base;
        }
        let mut suffix = 2_u32;
        loop {
            let candidate = format!("{base} {suffix}");
            if !self.contains(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub(crate) fn push(&mut self, plant: PlantTrait) {
        self.plants.push(plant);
    }

    pub(crate) fn replace(&mut self, name: &str, plant: PlantTrait) -> bool {
        match self.position(&normalize_plant_name(name)) {
            Some(index) => {
                self.plants[index] = plant;
                true
            }
            None => false,
        }
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.plants.iter().position(|plant| plant.name == normalized)
    }
}

impl Default for PlantLibrary {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Trims a plant name and collapses internal whitespace runs.
pub fn normalize_plant_name(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

/// Seed traits for a fresh planner.
pub fn default_plants() -> Vec<PlantTrait> {
    vec![
        PlantTrait {
            name: "Broccoli".to_string(),
            days_to_maturity: 70,
            spring_offset: -7,
            indoor_offset: Some(-42),
            start_method: StartMethod::Indoor,
            succession: false,
            replant_delay: 0,
            notes: String::new(),
        },
        PlantTrait {
            name: "Tomato".to_string(),
            days_to_maturity: 75,
            spring_offset: 14,
            indoor_offset: Some(-56),
            start_method: StartMethod::Indoor,
            succession: false,
            replant_delay: 0,
            notes: String::new(),
        },
        PlantTrait {
            name: "Lettuce".to_string(),
            days_to_maturity: 45,
            spring_offset: -14,
            indoor_offset: Some(-28),
            start_method: StartMethod::Indoor,
            succession: true,
            replant_delay: 7,
            notes: "Resow after each cutting.".to_string(),
        },
        PlantTrait {
            name: "Carrot".to_string(),
            days_to_maturity: 70,
            spring_offset: -14,
            indoor_offset: None,
            start_method: StartMethod::Outdoor,
            succession: false,
            replant_delay: 0,
            notes: String::new(),
        },
    ]
}
