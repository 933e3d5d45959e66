//! Planner domain model.
//!
//! # Responsibility
//! - Define plant traits, beds and the application state they live in.
//! - Keep persisted shapes (`serde`) next to the types they describe.
//!
//! # Invariants
//! - Planting records reference plants by name only; a missing trait is a
//!   valid state and must be handled by readers.
//! - Plants are never hard-deleted.

pub mod bed;
pub mod plant;
pub mod state;
