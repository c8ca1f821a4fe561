//! SurrealDB implementation of [`SpaceRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::space::{CreateSpace, Space, SpaceSummary, SpaceVisibility};
use tessera_core::repository::SpaceRepository;
use uuid::Uuid;

use super::project::organization_of;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SpaceRow {
    organization_id: String,
    project_id: String,
    name: String,
    visibility: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MemberRow {
    user_id: String,
}

fn parse_visibility(s: &str) -> Result<SpaceVisibility, DbError> {
    match s {
        "Public" => Ok(SpaceVisibility::Public),
        "Restricted" => Ok(SpaceVisibility::Restricted),
        other => Err(DbError::Decode(format!("unknown space visibility: {other}"))),
    }
}

fn visibility_str(v: SpaceVisibility) -> &'static str {
    match v {
        SpaceVisibility::Public => "Public",
        SpaceVisibility::Restricted => "Restricted",
    }
}

fn row_to_space(row: SpaceRow, id: Uuid) -> Result<Space, DbError> {
    Ok(Space {
        id,
        organization_id: parse_uuid(&row.organization_id, "organization")?,
        project_id: parse_uuid(&row.project_id, "project")?,
        name: row.name,
        visibility: parse_visibility(&row.visibility)?,
        created_at: row.created_at,
    })
}

/// SurrealDB implementation of the Space repository.
#[derive(Clone)]
pub struct SurrealSpaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSpaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_row(&self, id_str: &str) -> Result<SpaceRow, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('space', $id)")
            .bind(("id", id_str.to_string()))
            .await?;
        let rows: Vec<SpaceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("space", id_str))
    }
}

impl<C: Connection> SpaceRepository for SurrealSpaceRepository<C> {
    async fn create(&self, input: CreateSpace) -> TesseraResult<Space> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let project_id_str = input.project_id.to_string();
        let organization_id = organization_of(&self.db, &project_id_str).await?;

        // Space + member rows in one transaction.
        let mut query = String::from(
            "BEGIN TRANSACTION; \
             CREATE type::record('space', $id) SET \
             organization_id = $organization_id, project_id = $project_id, \
             name = $name, visibility = $visibility;",
        );
        for member in &input.members {
            query.push_str(&format!(
                " CREATE space_member SET space_id = $id, user_id = '{member}';"
            ));
        }
        query.push_str(" COMMIT TRANSACTION;");

        self.db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .bind(("project_id", project_id_str))
            .bind(("name", input.name))
            .bind(("visibility", visibility_str(input.visibility)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let row = self.fetch_row(&id_str).await?;
        row_to_space(row, id).map_err(Into::into)
    }

    async fn get_space_summary(&self, space_id: Uuid) -> TesseraResult<SpaceSummary> {
        let id_str = space_id.to_string();
        let row = self.fetch_row(&id_str).await?;

        let mut result = self
            .db
            .query("SELECT user_id FROM space_member WHERE space_id = $id")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;
        let members: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let members = members
            .iter()
            .map(|m| parse_uuid(&m.user_id, "member"))
            .collect::<Result<Vec<_>, DbError>>()?;

        let space = row_to_space(row, space_id)?;
        Ok(SpaceSummary {
            id: space.id,
            organization_id: space.organization_id,
            project_id: space.project_id,
            visibility: space.visibility,
            members,
        })
    }

    async fn set_visibility(
        &self,
        space_id: Uuid,
        visibility: SpaceVisibility,
    ) -> TesseraResult<()> {
        let id_str = space_id.to_string();
        self.fetch_row(&id_str).await?;

        self.db
            .query("UPDATE type::record('space', $id) SET visibility = $visibility")
            .bind(("id", id_str))
            .bind(("visibility", visibility_str(visibility)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn add_member(&self, space_id: Uuid, user_id: Uuid) -> TesseraResult<()> {
        let id_str = space_id.to_string();
        self.fetch_row(&id_str).await?;

        // Idempotent: skip if the membership already exists.
        self.db
            .query(
                "IF (SELECT * FROM space_member \
                     WHERE space_id = $space_id AND user_id = $user_id) = [] { \
                     CREATE space_member SET space_id = $space_id, user_id = $user_id \
                 };",
            )
            .bind(("space_id", id_str))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn remove_member(&self, space_id: Uuid, user_id: Uuid) -> TesseraResult<()> {
        self.db
            .query("DELETE space_member WHERE space_id = $space_id AND user_id = $user_id")
            .bind(("space_id", space_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete(&self, space_id: Uuid) -> TesseraResult<()> {
        let id_str = space_id.to_string();

        self.db
            .query(
                "DELETE space_member WHERE space_id = $id; \
                 DELETE type::record('space', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}
