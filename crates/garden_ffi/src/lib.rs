//! Flutter-facing bindings for the garden planner core.

pub mod api;
