//! Snapshot persistence over a key-value store.
//!
//! # Responsibility
//! - Define the key-value contract the planner persists through.
//! - Encode/decode the `plants` and `beds` snapshot entries.
//!
//! # Invariants
//! - Keys are non-blank; values are JSON text.
//! - Decode failures are reported as data, never as panics, so callers can
//!   fall back to defaults.

pub mod kv_repo;
pub mod snapshot;
