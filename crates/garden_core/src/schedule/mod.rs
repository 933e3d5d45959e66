//! Pure date arithmetic and derived schedules.
//!
//! # Responsibility
//! - Date parsing/formatting helpers.
//! - Succession planting generation.
//! - Calendar projection over the current state.
//!
//! # Invariants
//! - Nothing here mutates planner state or performs I/O.

pub mod calendar;
pub mod date;
pub mod succession;
