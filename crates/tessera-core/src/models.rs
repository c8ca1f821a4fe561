//! Domain models for Tessera.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod chart;
pub mod dashboard;
pub mod event;
pub mod pinned_list;
pub mod project;
pub mod scheduler;
pub mod space;
