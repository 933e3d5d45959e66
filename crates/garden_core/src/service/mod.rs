//! Planner use cases.
//!
//! # Responsibility
//! - Express user mutations as reducer actions over `GardenState`.
//! - Orchestrate snapshot loading/saving around those actions.

pub mod actions;
pub mod planner_service;
