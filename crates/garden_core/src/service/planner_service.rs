//! Planner use-case service.
//!
//! # Responsibility
//! - Load state from snapshots, falling back to defaults.
//! - Dispatch actions through the reducer and persist changed entries.
//! - Expose derived views (calendar, succession schedule).
//!
//! # Invariants
//! - The in-memory state only changes on a successful action.
//! - Snapshot writes are fire-and-forget: a failed write is logged and the
//!   in-memory change stands.
//! - Only entries whose content changed are rewritten.

use crate::model::bed::Bed;
use crate::model::plant::PlantLibrary;
use crate::model::state::{default_beds, FrostDates, GardenState};
use crate::db::DbError;
use crate::repo::kv_repo::{KeyValueRepository, RepoError, RepoResult, SqliteKeyValueRepository};
use crate::repo::snapshot::{
    load_beds, load_plants, save_beds, save_plants, SnapshotLoad, BEDS_KEY, PLANTS_KEY,
};
use crate::schedule::calendar::{project_calendar, project_with_successions, Calendar};
use crate::schedule::succession::{succession_schedule, SuccessionEntry};
use crate::service::actions::{Action, ActionError};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PlannerResult<T> = Result<T, PlannerError>;

/// Failure surfaced to planner callers.
#[derive(Debug)]
pub enum PlannerError {
    /// The reducer refused the action.
    Rejected(ActionError),
    /// Storage could not be opened or read.
    Repo(RepoError),
}

impl Display for PlannerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for PlannerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ActionError> for PlannerError {
    fn from(value: ActionError) -> Self {
        Self::Rejected(value)
    }
}

impl From<RepoError> for PlannerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for PlannerError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Planner facade over a key-value snapshot store.
pub struct PlannerService<R: KeyValueRepository> {
    repo: R,
    state: GardenState,
}

impl<R: KeyValueRepository> PlannerService<R> {
    /// Loads persisted state, using defaults for missing or corrupt entries.
    ///
    /// # Errors
    /// - Returns storage-level failures (the store itself is unreadable).
    pub fn load(repo: R, frost: FrostDates) -> RepoResult<Self> {
        let plants = log_load(PLANTS_KEY, load_plants(&repo)?).or_else(PlantLibrary::seeded);
        let beds = log_load(BEDS_KEY, load_beds(&repo)?).or_else(default_beds);
        let state = GardenState::new(plants, beds, frost);
        info!(
            "event=state_load module=service status=ok plants={} beds={}",
            state.plants().len(),
            state.beds().len()
        );
        Ok(Self { repo, state })
    }

    /// Wraps an already-built state without reading storage.
    pub fn with_state(repo: R, state: GardenState) -> Self {
        Self { repo, state }
    }

    pub fn state(&self) -> &GardenState {
        &self.state
    }

    pub fn into_state(self) -> GardenState {
        self.state
    }

    /// Applies `action`, then persists the entries it changed.
    ///
    /// # Errors
    /// Returns the rejection reason; state and storage are left untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<&GardenState, ActionError> {
        let next = match self.state.apply(&action) {
            Ok(next) => next,
            Err(err) => {
                info!(
                    "event=action module=service status=rejected action={} error_code={}",
                    action.name(),
                    err.code()
                );
                return Err(err);
            }
        };

        let plants_changed = next.plants() != self.state.plants();
        let beds_changed = next.beds() != self.state.beds();
        self.state = next;
        debug!(
            "event=action module=service status=ok action={} plants_changed={} beds_changed={}",
            action.name(),
            plants_changed,
            beds_changed
        );

        if plants_changed {
            self.persist_plants();
        }
        if beds_changed {
            self.persist_beds();
        }
        Ok(&self.state)
    }

    /// Writes both snapshot entries unconditionally.
    pub fn save_all(&self) -> RepoResult<()> {
        save_plants(&self.repo, self.state.plants())?;
        save_beds(&self.repo, self.state.beds())?;
        Ok(())
    }

    /// Outdoor and indoor-start events for the current state.
    pub fn calendar(&self) -> Calendar {
        project_calendar(self.state.beds(), self.state.plants())
    }

    /// Calendar including succession sowings before the fall frost date.
    pub fn calendar_with_successions(&self) -> Calendar {
        project_with_successions(
            self.state.beds(),
            self.state.plants(),
            self.state.frost().fall,
        )
    }

    pub fn successions(&self) -> Vec<SuccessionEntry> {
        succession_schedule(&self.state)
    }

    pub fn bed(&self, name: &str) -> Option<&Bed> {
        self.state.bed(name)
    }

    fn persist_plants(&self) {
        if let Err(err) = save_plants(&self.repo, self.state.plants()) {
            error!(
                "event=snapshot_save module=service status=error key={} error={}",
                PLANTS_KEY, err
            );
        }
    }

    fn persist_beds(&self) {
        if let Err(err) = save_beds(&self.repo, self.state.beds()) {
            error!(
                "event=snapshot_save module=service status=error key={} error={}",
                BEDS_KEY, err
            );
        }
    }
}

impl<'conn> PlannerService<SqliteKeyValueRepository<'conn>> {
    /// Loads the planner over a connection opened with `open_db`.
    pub fn open(conn: &'conn Connection, frost: FrostDates) -> PlannerResult<Self> {
        let repo = SqliteKeyValueRepository::try_new(conn)?;
        Ok(Self::load(repo, frost)?)
    }
}

fn log_load<T>(key: &str, load: SnapshotLoad<T>) -> SnapshotLoad<T> {
    match &load {
        SnapshotLoad::Loaded(_) => {
            debug!("event=snapshot_load module=service status=ok key={key}")
        }
        SnapshotLoad::Missing => {
            info!("event=snapshot_load module=service status=fallback key={key} reason=missing")
        }
        SnapshotLoad::Corrupt(message) => warn!(
            "event=snapshot_load module=service status=fallback key={key} reason=corrupt error={message}"
        ),
    }
    load
}
