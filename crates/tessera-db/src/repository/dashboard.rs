//! SurrealDB implementation of [`DashboardRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::dashboard::{CreateDashboard, DashboardSummary};
use tessera_core::repository::DashboardRepository;
use uuid::Uuid;

use super::project::organization_of;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct DashboardRow {
    project_id: String,
    space_id: String,
    name: String,
}

/// Space a dashboard is placed in.
pub(crate) async fn dashboard_space<C: Connection>(
    db: &Surreal<C>,
    dashboard_id: &str,
) -> Result<Uuid, DbError> {
    let row = fetch_row(db, dashboard_id).await?;
    parse_uuid(&row.space_id, "space")
}

async fn fetch_row<C: Connection>(
    db: &Surreal<C>,
    id_str: &str,
) -> Result<DashboardRow, DbError> {
    let mut result = db
        .query("SELECT * FROM type::record('dashboard', $id)")
        .bind(("id", id_str.to_string()))
        .await?;
    let rows: Vec<DashboardRow> = result.take(0)?;
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("dashboard", id_str))
}

/// SurrealDB implementation of the Dashboard repository.
#[derive(Clone)]
pub struct SurrealDashboardRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDashboardRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DashboardRepository for SurrealDashboardRepository<C> {
    async fn create(&self, input: CreateDashboard) -> TesseraResult<DashboardSummary> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        self.db
            .query(
                "CREATE type::record('dashboard', $id) SET \
                 project_id = $project_id, space_id = $space_id, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("space_id", input.space_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_summary(id).await
    }

    async fn get_summary(&self, dashboard_id: Uuid) -> TesseraResult<DashboardSummary> {
        let row = fetch_row(&self.db, &dashboard_id.to_string()).await?;
        let organization_id = organization_of(&self.db, &row.project_id).await?;

        Ok(DashboardSummary {
            id: dashboard_id,
            organization_id,
            project_id: parse_uuid(&row.project_id, "project")?,
            space_id: parse_uuid(&row.space_id, "space")?,
            name: row.name,
        })
    }
}
