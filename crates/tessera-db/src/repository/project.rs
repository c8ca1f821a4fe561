//! SurrealDB implementation of [`ProjectRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::project::{CreateProject, Project};
use tessera_core::repository::ProjectRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ProjectRow {
    organization_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

fn row_to_project(row: ProjectRow, id: Uuid) -> Result<Project, DbError> {
    Ok(Project {
        id,
        organization_id: parse_uuid(&row.organization_id, "organization")?,
        name: row.name,
        created_at: row.created_at,
    })
}

/// Organization of a project, used by the other repositories to fill in
/// authorization attributes.
pub(crate) async fn organization_of<C: Connection>(
    db: &Surreal<C>,
    project_id: &str,
) -> Result<Uuid, DbError> {
    let mut result = db
        .query("SELECT * FROM type::record('project', $id)")
        .bind(("id", project_id.to_string()))
        .await?;
    let rows: Vec<ProjectRow> = result.take(0)?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("project", project_id))?;
    parse_uuid(&row.organization_id, "organization")
}

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> TesseraResult<Project> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('project', $id) SET \
                 organization_id = $organization_id, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("project", &id_str))?;

        row_to_project(row, id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> TesseraResult<Project> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('project', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("project", &id_str))?;

        row_to_project(row, id).map_err(Into::into)
    }
}
