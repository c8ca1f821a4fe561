//! Tessera Core: domain models, error taxonomy, repository traits and
//! the capability model shared by every crate in the workspace.

pub mod ability;
pub mod error;
pub mod models;
pub mod repository;
