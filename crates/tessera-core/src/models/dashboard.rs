//! Dashboard domain model.
//!
//! Dashboards are owned elsewhere; this subsystem only needs their
//! placement to attach charts and resolve access.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub space_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDashboard {
    pub project_id: Uuid,
    pub space_id: Uuid,
    pub name: String,
}
