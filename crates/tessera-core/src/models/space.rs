//! Space domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpaceVisibility {
    /// Any actor of the owning organization may reach the space.
    Public,
    /// Only listed members may reach the space.
    Restricted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub visibility: SpaceVisibility,
    pub created_at: DateTime<Utc>,
}

/// Visibility and membership of a space, as needed for access checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub visibility: SpaceVisibility,
    pub members: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpace {
    pub project_id: Uuid,
    pub name: String,
    pub visibility: SpaceVisibility,
    pub members: Vec<Uuid>,
}
