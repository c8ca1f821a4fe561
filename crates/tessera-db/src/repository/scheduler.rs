//! SurrealDB implementation of [`SchedulerRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::scheduler::{
    CreateScheduler, CreateSchedulerTarget, Scheduler, SchedulerFormat, SchedulerOwner,
    SchedulerTarget,
};
use tessera_core::repository::SchedulerRepository;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_opt_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SchedulerRow {
    record_id: String,
    name: String,
    message: Option<String>,
    cron: String,
    format: String,
    saved_chart_id: Option<String>,
    dashboard_id: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TargetRow {
    record_id: String,
    target_type: String,
    destination: String,
}

fn row_to_target(row: TargetRow) -> Result<SchedulerTarget, DbError> {
    let id = parse_uuid(&row.record_id, "scheduler target")?;
    match row.target_type.as_str() {
        "slack" => Ok(SchedulerTarget::Slack {
            id,
            channel: row.destination,
        }),
        "email" => Ok(SchedulerTarget::Email {
            id,
            recipient: row.destination,
        }),
        other => Err(DbError::Decode(format!("unknown target type: {other}"))),
    }
}

fn owner_of(row: &SchedulerRow) -> Result<SchedulerOwner, DbError> {
    let chart = parse_opt_uuid(row.saved_chart_id.as_deref(), "saved chart")?;
    let dashboard = parse_opt_uuid(row.dashboard_id.as_deref(), "dashboard")?;
    match (chart, dashboard) {
        (Some(id), None) => Ok(SchedulerOwner::Chart(id)),
        (None, Some(id)) => Ok(SchedulerOwner::Dashboard(id)),
        _ => Err(DbError::Decode(format!(
            "scheduler {} must belong to exactly one chart or dashboard",
            row.record_id
        ))),
    }
}

/// SurrealDB implementation of the Scheduler repository.
#[derive(Clone)]
pub struct SurrealSchedulerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSchedulerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn load_targets(&self, scheduler_id: &str) -> Result<Vec<SchedulerTarget>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, target_type, destination, position \
                 FROM scheduler_target WHERE scheduler_id = $scheduler_id \
                 ORDER BY position ASC",
            )
            .bind(("scheduler_id", scheduler_id.to_string()))
            .await?;
        let rows: Vec<TargetRow> = result.take(0)?;
        rows.into_iter().map(row_to_target).collect()
    }

    async fn row_to_scheduler(&self, row: SchedulerRow) -> Result<Scheduler, DbError> {
        let owner = owner_of(&row)?;
        let format = SchedulerFormat::parse(&row.format)
            .ok_or_else(|| DbError::Decode(format!("unknown scheduler format: {}", row.format)))?;
        let targets = self.load_targets(&row.record_id).await?;

        Ok(Scheduler {
            id: parse_uuid(&row.record_id, "scheduler")?,
            name: row.name,
            message: row.message,
            cron: row.cron,
            format,
            owner,
            created_by: parse_uuid(&row.created_by, "user")?,
            targets,
            created_at: row.created_at,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Scheduler, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('scheduler', $id)")
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<SchedulerRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("scheduler", id))?;
        self.row_to_scheduler(row).await
    }
}

impl<C: Connection> SchedulerRepository for SurrealSchedulerRepository<C> {
    async fn create_scheduler(
        &self,
        owner: SchedulerOwner,
        created_by: Uuid,
        input: CreateScheduler,
    ) -> TesseraResult<Scheduler> {
        let id = Uuid::new_v4();
        let (saved_chart_id, dashboard_id) = match owner {
            SchedulerOwner::Chart(chart_id) => (Some(chart_id.to_string()), None),
            SchedulerOwner::Dashboard(dashboard_id) => (None, Some(dashboard_id.to_string())),
        };

        let mut query = String::from(
            "BEGIN TRANSACTION; \
             CREATE type::record('scheduler', $id) SET \
             name = $name, message = $message, cron = $cron, format = $format, \
             saved_chart_id = $saved_chart_id, dashboard_id = $dashboard_id, \
             created_by = $created_by;",
        );
        for (position, target) in input.targets.iter().enumerate() {
            let target_type = match target {
                CreateSchedulerTarget::Slack { .. } => "slack",
                CreateSchedulerTarget::Email { .. } => "email",
            };
            query.push_str(&format!(
                " CREATE type::record('scheduler_target', '{}') SET \
                 scheduler_id = $id, target_type = '{target_type}', \
                 destination = $destination_{position}, position = {position};",
                Uuid::new_v4(),
            ));
        }
        query.push_str(" COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("message", input.message))
            .bind(("cron", input.cron))
            .bind(("format", input.format.as_str()))
            .bind(("saved_chart_id", saved_chart_id))
            .bind(("dashboard_id", dashboard_id))
            .bind(("created_by", created_by.to_string()));
        for (position, target) in input.targets.into_iter().enumerate() {
            let destination = match target {
                CreateSchedulerTarget::Slack { channel } => channel,
                CreateSchedulerTarget::Email { recipient } => recipient,
            };
            builder = builder.bind((format!("destination_{position}"), destination));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(
            scheduler_id = %id,
            resource_type = owner.resource_type(),
            resource_id = %owner.resource_id(),
            "Created scheduler"
        );
        self.fetch(id).await.map_err(Into::into)
    }

    async fn get_chart_schedulers(&self, chart_id: Uuid) -> TesseraResult<Vec<Scheduler>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scheduler \
                 WHERE saved_chart_id = $chart_id \
                 ORDER BY created_at ASC",
            )
            .bind(("chart_id", chart_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<SchedulerRow> = result.take(0).map_err(DbError::from)?;

        let mut schedulers = Vec::with_capacity(rows.len());
        for row in rows {
            schedulers.push(self.row_to_scheduler(row).await?);
        }
        Ok(schedulers)
    }
}
