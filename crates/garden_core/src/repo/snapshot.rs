//! Typed `plants` / `beds` snapshot entries.
//!
//! # Responsibility
//! - Serialize the plant library and bed list as JSON values.
//! - Decode stored values, accepting the legacy `{ bedName: grid }` shape.
//!
//! # Invariants
//! - Writes always use the current shapes: plant array and `{ name, grid }`
//!   bed array.
//! - A value that fails to decode is reported as `Corrupt`, not as an error.

use crate::model::bed::{Bed, GridRow};
use crate::model::plant::PlantLibrary;
use crate::repo::kv_repo::{KeyValueRepository, RepoError, RepoResult};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const PLANTS_KEY: &str = "plants";
pub const BEDS_KEY: &str = "beds";

/// Outcome of reading one snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad<T> {
    Loaded(T),
    Missing,
    /// Stored value exists but does not decode; carries the decode message.
    Corrupt(String),
}

impl<T> SnapshotLoad<T> {
    /// Returns the loaded value or `fallback()` for missing/corrupt entries.
    pub fn or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Corrupt(_) => fallback(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBeds {
    List(Vec<Bed>),
    Legacy(BTreeMap<String, Vec<GridRow>>),
}

pub fn load_plants(repo: &impl KeyValueRepository) -> RepoResult<SnapshotLoad<PlantLibrary>> {
    Ok(match repo.get(PLANTS_KEY)? {
        Some(raw) => match decode_plants(&raw) {
            Ok(library) => SnapshotLoad::Loaded(library),
            Err(message) => SnapshotLoad::Corrupt(message),
        },
        None => SnapshotLoad::Missing,
    })
}

pub fn load_beds(repo: &impl KeyValueRepository) -> RepoResult<SnapshotLoad<Vec<Bed>>> {
    Ok(match repo.get(BEDS_KEY)? {
        Some(raw) => match decode_beds(&raw) {
            Ok(beds) => SnapshotLoad::Loaded(beds),
            Err(message) => SnapshotLoad::Corrupt(message),
        },
        None => SnapshotLoad::Missing,
    })
}

pub fn save_plants(repo: &impl KeyValueRepository, plants: &PlantLibrary) -> RepoResult<()> {
    let raw = serde_json::to_string(plants).map_err(|err| RepoError::Encode {
        key: PLANTS_KEY.to_string(),
        message: err.to_string(),
    })?;
    repo.put(PLANTS_KEY, &raw)
}

pub fn save_beds(repo: &impl KeyValueRepository, beds: &[Bed]) -> RepoResult<()> {
    let raw = serde_json::to_string(beds).map_err(|err| RepoError::Encode {
        key: BEDS_KEY.to_string(),
        message: err.to_string(),
    })?;
    repo.put(BEDS_KEY, &raw)
}

/// Decodes a stored plant array.
pub fn decode_plants(raw: &str) -> Result<PlantLibrary, String> {
    serde_json::from_str::<PlantLibrary>(raw).map_err(|err| err.to_string())
}

/// Decodes a stored bed array or a legacy name → grid object.
///
/// Legacy objects come back in ascending name order.
pub fn decode_beds(raw: &str) -> Result<Vec<Bed>, String> {
    match serde_json::from_str::<StoredBeds>(raw).map_err(|err| err.to_string())? {
        StoredBeds::List(beds) => Ok(beds),
        StoredBeds::Legacy(grids) => grids
            .into_iter()
            .map(|(name, grid)| Bed::from_grid(name, grid).map_err(|err| err.to_string()))
            .collect(),
    }
}
