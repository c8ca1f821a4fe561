//! SurrealDB implementation of [`SavedChartRepository`].
//!
//! A chart row carries its placement and the number of its latest
//! version; version payloads live in `saved_chart_version`, one row per
//! version. Writes to a chart hold its slot in [`CHARTS`]. A writer in
//! another process that takes the same version number trips the unique
//! `(chart_id, version)` index, and the append is retried on top of it.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::chart::{
    ChartParent, ChartSummary, ChartVersionSpec, ChartViewStats, CreateSavedChart, SavedChart,
    UpdateMultipleSavedChart, UpdateSavedChart,
};
use tessera_core::models::pinned_list::PinnedItemRef;
use tessera_core::repository::SavedChartRepository;
use tracing::debug;
use uuid::Uuid;

use super::dashboard::dashboard_space;
use super::pinned_list::{list_containing, membership_of, rewrite_items_statements};
use super::project::organization_of;
use crate::error::{DbError, parse_opt_uuid, parse_uuid};
use crate::locks::{CHARTS, PINNED_LISTS};

/// Attempts at appending a version when other processes keep winning.
const VERSION_ATTEMPTS: u32 = 3;

#[derive(Debug, SurrealValue)]
struct ChartRow {
    project_id: String,
    space_id: Option<String>,
    dashboard_id: Option<String>,
    name: String,
    description: Option<String>,
    latest_version: u32,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct VersionRow {
    spec: serde_json::Value,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct ViewedAtRow {
    viewed_at: DateTime<Utc>,
}

/// Where a chart sits and what governs access to it.
struct Placement {
    organization_id: Uuid,
    project_id: Uuid,
    parent: ChartParent,
    space_id: Option<Uuid>,
    pinned_list_id: Option<Uuid>,
}

fn parent_columns(parent: ChartParent) -> (Option<String>, Option<String>) {
    (
        parent.space_id().map(|id| id.to_string()),
        parent.dashboard_id().map(|id| id.to_string()),
    )
}

fn encode_spec(spec: &ChartVersionSpec) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(spec).map_err(|e| DbError::Decode(format!("chart spec: {e}")))
}

/// SurrealDB implementation of the Saved Chart repository.
#[derive(Clone)]
pub struct SurrealSavedChartRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSavedChartRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Write version `version` and make it the latest, in one transaction.
    async fn append_version(
        &self,
        id: Uuid,
        version: u32,
        spec: serde_json::Value,
        created_by: Uuid,
    ) -> Result<(), DbError> {
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE saved_chart_version SET chart_id = $id, \
                 version = $version, spec = $spec, created_by = $user_id; \
                 UPDATE type::record('saved_chart', $id) SET \
                 latest_version = $version, updated_by = $user_id, \
                 updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("version", version))
            .bind(("spec", spec))
            .bind(("user_id", created_by.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn fetch_row(&self, id: Uuid) -> Result<ChartRow, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('saved_chart', $id)")
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<ChartRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("saved_chart", id))
    }

    async fn placement(&self, id: Uuid, row: &ChartRow) -> Result<Placement, DbError> {
        let project_id = parse_uuid(&row.project_id, "project")?;
        let organization_id = organization_of(&self.db, &row.project_id).await?;
        let parent = ChartParent::from_columns(
            parse_opt_uuid(row.space_id.as_deref(), "space")?,
            parse_opt_uuid(row.dashboard_id.as_deref(), "dashboard")?,
        );

        // A chart in a dashboard is reached through the dashboard's space.
        // If that dashboard is gone the chart has no governing space and the
        // space check denies everyone.
        let space_id = match parent {
            ChartParent::Space(space_id) => Some(space_id),
            ChartParent::Dashboard(dashboard_id) => {
                match dashboard_space(&self.db, &dashboard_id.to_string()).await {
                    Ok(space_id) => Some(space_id),
                    Err(DbError::NotFound { .. }) => None,
                    Err(e) => return Err(e),
                }
            }
            ChartParent::Orphan => None,
        };

        let pinned_list_id = membership_of(&self.db, PinnedItemRef::chart(id)).await?;

        Ok(Placement {
            organization_id,
            project_id,
            parent,
            space_id,
            pinned_list_id,
        })
    }

    async fn version_spec(&self, id: Uuid, version: u32) -> Result<ChartVersionSpec, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT spec FROM saved_chart_version \
                 WHERE chart_id = $id AND version = $version",
            )
            .bind(("id", id.to_string()))
            .bind(("version", version))
            .await?;
        let rows: Vec<VersionRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("saved_chart_version", format!("{id}@{version}")))?;
        serde_json::from_value(row.spec).map_err(|e| DbError::Decode(format!("chart spec: {e}")))
    }

    async fn load(&self, id: Uuid) -> Result<SavedChart, DbError> {
        let row = self.fetch_row(id).await?;
        let placement = self.placement(id, &row).await?;
        let spec = self.version_spec(id, row.latest_version).await?;

        Ok(SavedChart {
            id,
            organization_id: placement.organization_id,
            project_id: placement.project_id,
            parent: placement.parent,
            space_id: placement.space_id,
            name: row.name,
            description: row.description,
            version: row.latest_version,
            spec,
            pinned_list_id: placement.pinned_list_id,
            updated_by: parse_uuid(&row.updated_by, "user")?,
            updated_at: row.updated_at,
        })
    }
}

impl<C: Connection> SavedChartRepository for SurrealSavedChartRepository<C> {
    async fn get_summary(&self, id: Uuid) -> TesseraResult<ChartSummary> {
        let row = self.fetch_row(id).await?;
        let placement = self.placement(id, &row).await?;

        Ok(ChartSummary {
            id,
            organization_id: placement.organization_id,
            project_id: placement.project_id,
            name: row.name,
            parent: placement.parent,
            space_id: placement.space_id,
            pinned_list_id: placement.pinned_list_id,
        })
    }

    async fn get(&self, id: Uuid) -> TesseraResult<SavedChart> {
        self.load(id).await.map_err(Into::into)
    }

    async fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: CreateSavedChart,
    ) -> TesseraResult<SavedChart> {
        let id = Uuid::new_v4();
        let (space_id, dashboard_id) = parent_columns(input.parent);
        let spec = encode_spec(&input.spec)?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('saved_chart', $id) SET \
                 project_id = $project_id, space_id = $space_id, \
                 dashboard_id = $dashboard_id, name = $name, \
                 description = $description, latest_version = 1, \
                 updated_by = $user_id; \
                 CREATE saved_chart_version SET chart_id = $id, version = 1, \
                 spec = $spec, created_by = $user_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("project_id", project_id.to_string()))
            .bind(("space_id", space_id))
            .bind(("dashboard_id", dashboard_id))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("user_id", created_by.to_string()))
            .bind(("spec", spec))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(chart_id = %id, %project_id, "Created saved chart");
        self.load(id).await.map_err(Into::into)
    }

    async fn create_version(
        &self,
        id: Uuid,
        spec: ChartVersionSpec,
        created_by: Uuid,
    ) -> TesseraResult<SavedChart> {
        let spec = encode_spec(&spec)?;
        {
            let _guard = CHARTS.lock(id).await;
            let mut attempt = 1;
            loop {
                let version = self.fetch_row(id).await?.latest_version + 1;
                match self.append_version(id, version, spec.clone(), created_by).await {
                    Ok(()) => {
                        debug!(chart_id = %id, version, "Appended chart version");
                        break;
                    }
                    Err(e) => {
                        let taken = self.fetch_row(id).await?.latest_version >= version;
                        if !taken || attempt >= VERSION_ATTEMPTS {
                            return Err(e.into());
                        }
                        debug!(
                            chart_id = %id,
                            version,
                            attempt,
                            error = %e,
                            "Version taken by another writer, retrying"
                        );
                        attempt += 1;
                    }
                }
            }
        }
        self.load(id).await.map_err(Into::into)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateSavedChart,
        updated_by: Uuid,
    ) -> TesseraResult<SavedChart> {
        {
            let _guard = CHARTS.lock(id).await;
            self.fetch_row(id).await?;

            let mut sets = Vec::new();
            if input.name.is_some() {
                sets.push("name = $name");
            }
            if input.description.is_some() {
                sets.push("description = $description");
            }
            if input.parent.is_some() {
                sets.push("space_id = $space_id");
                sets.push("dashboard_id = $dashboard_id");
            }
            sets.push("updated_by = $user_id");
            sets.push("updated_at = time::now()");

            let query = format!(
                "UPDATE type::record('saved_chart', $id) SET {}",
                sets.join(", ")
            );

            let mut builder = self
                .db
                .query(&query)
                .bind(("id", id.to_string()))
                .bind(("user_id", updated_by.to_string()));

            if let Some(name) = input.name {
                builder = builder.bind(("name", name));
            }
            if let Some(description) = input.description {
                builder = builder.bind(("description", description));
            }
            if let Some(parent) = input.parent {
                let (space_id, dashboard_id) = parent_columns(parent);
                builder = builder
                    .bind(("space_id", space_id))
                    .bind(("dashboard_id", dashboard_id));
            }

            builder
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| DbError::Query(e.to_string()))?;
        }
        self.load(id).await.map_err(Into::into)
    }

    async fn update_multiple(
        &self,
        inputs: Vec<UpdateMultipleSavedChart>,
        updated_by: Uuid,
    ) -> TesseraResult<Vec<SavedChart>> {
        let ids: Vec<Uuid> = inputs.iter().map(|input| input.id).collect();
        {
            let _guards = CHARTS.lock_all(ids.iter().copied()).await;
            for id in &ids {
                self.fetch_row(*id).await?;
            }

            let mut query = String::from("BEGIN TRANSACTION;");
            for (i, input) in inputs.iter().enumerate() {
                query.push_str(&format!(
                    " UPDATE type::record('saved_chart', '{}') SET \
                     name = $name_{i}, description = $description_{i}, \
                     space_id = '{}', dashboard_id = NONE, \
                     updated_by = $user_id, updated_at = time::now();",
                    input.id, input.space_id,
                ));
            }
            query.push_str(" COMMIT TRANSACTION;");

            let mut builder = self
                .db
                .query(query)
                .bind(("user_id", updated_by.to_string()));
            for (i, input) in inputs.into_iter().enumerate() {
                builder = builder
                    .bind((format!("name_{i}"), input.name))
                    .bind((format!("description_{i}"), input.description));
            }

            builder
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| DbError::Query(e.to_string()))?;
        }

        let mut charts = Vec::with_capacity(ids.len());
        for id in ids {
            charts.push(self.load(id).await?);
        }
        Ok(charts)
    }

    async fn delete(&self, id: Uuid) -> TesseraResult<SavedChart> {
        let chart = self.load(id).await?;

        // Lock order: pinned lists, then charts.
        let _pins = PINNED_LISTS.lock(chart.project_id).await;
        let _charts = CHARTS.lock(id).await;

        let mut query = String::from(
            "BEGIN TRANSACTION; \
             DELETE scheduler_target WHERE scheduler_id IN \
                 (SELECT VALUE meta::id(id) FROM scheduler WHERE saved_chart_id = $id); \
             DELETE scheduler WHERE saved_chart_id = $id; \
             DELETE chart_view WHERE chart_id = $id; \
             DELETE saved_chart_version WHERE chart_id = $id; \
             DELETE type::record('saved_chart', $id);",
        );

        let item = PinnedItemRef::chart(id);
        if let Some(mut list) = list_containing(&self.db, item).await? {
            list.unpin(&item);
            query.push(' ');
            query.push_str(&rewrite_items_statements(&list));
        }
        query.push_str(" COMMIT TRANSACTION;");

        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(chart_id = %id, "Deleted saved chart");
        Ok(chart)
    }

    async fn add_view(&self, id: Uuid, user_id: Uuid) -> TesseraResult<()> {
        self.db
            .query("CREATE chart_view SET chart_id = $id, user_id = $user_id")
            .bind(("id", id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_view_stats(&self, id: Uuid) -> TesseraResult<ChartViewStats> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM chart_view \
                 WHERE chart_id = $id GROUP ALL; \
                 SELECT viewed_at FROM chart_view WHERE chart_id = $id \
                 ORDER BY viewed_at ASC LIMIT 1;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let counts: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let first: Vec<ViewedAtRow> = result.take(1).map_err(DbError::from)?;

        Ok(ChartViewStats {
            views: counts.first().map(|r| r.total).unwrap_or(0),
            first_viewed_at: first.first().map(|r| r.viewed_at),
        })
    }
}
