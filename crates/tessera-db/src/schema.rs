//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Projects (organization scope)
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE project TYPE string;
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Spaces and their members (project scope)
-- =======================================================================
DEFINE TABLE space SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE space TYPE string;
DEFINE FIELD project_id ON TABLE space TYPE string;
DEFINE FIELD name ON TABLE space TYPE string;
DEFINE FIELD visibility ON TABLE space TYPE string \
    ASSERT $value IN ['Public', 'Restricted'];
DEFINE FIELD created_at ON TABLE space TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_space_project ON TABLE space COLUMNS project_id;

DEFINE TABLE space_member SCHEMAFULL;
DEFINE FIELD space_id ON TABLE space_member TYPE string;
DEFINE FIELD user_id ON TABLE space_member TYPE string;
DEFINE INDEX idx_space_member_unique ON TABLE space_member \
    COLUMNS space_id, user_id UNIQUE;

-- =======================================================================
-- Dashboards (project scope, placed in a space)
-- =======================================================================
DEFINE TABLE dashboard SCHEMAFULL;
DEFINE FIELD project_id ON TABLE dashboard TYPE string;
DEFINE FIELD space_id ON TABLE dashboard TYPE string;
DEFINE FIELD name ON TABLE dashboard TYPE string;
DEFINE FIELD created_at ON TABLE dashboard TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Saved charts and their versions (project scope)
-- =======================================================================
DEFINE TABLE saved_chart SCHEMAFULL;
DEFINE FIELD project_id ON TABLE saved_chart TYPE string;
DEFINE FIELD space_id ON TABLE saved_chart TYPE option<string>;
DEFINE FIELD dashboard_id ON TABLE saved_chart TYPE option<string>;
DEFINE FIELD name ON TABLE saved_chart TYPE string;
DEFINE FIELD description ON TABLE saved_chart TYPE option<string>;
DEFINE FIELD latest_version ON TABLE saved_chart TYPE int;
DEFINE FIELD updated_by ON TABLE saved_chart TYPE string;
DEFINE FIELD created_at ON TABLE saved_chart TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE saved_chart TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_saved_chart_project ON TABLE saved_chart \
    COLUMNS project_id;

DEFINE TABLE saved_chart_version SCHEMAFULL;
DEFINE FIELD chart_id ON TABLE saved_chart_version TYPE string;
DEFINE FIELD version ON TABLE saved_chart_version TYPE int;
DEFINE FIELD spec ON TABLE saved_chart_version TYPE object FLEXIBLE;
DEFINE FIELD created_by ON TABLE saved_chart_version TYPE string;
DEFINE FIELD created_at ON TABLE saved_chart_version TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_chart_version_unique ON TABLE saved_chart_version \
    COLUMNS chart_id, version UNIQUE;

DEFINE TABLE chart_view SCHEMAFULL;
DEFINE FIELD chart_id ON TABLE chart_view TYPE string;
DEFINE FIELD user_id ON TABLE chart_view TYPE string;
DEFINE FIELD viewed_at ON TABLE chart_view TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_chart_view_chart ON TABLE chart_view COLUMNS chart_id;

-- =======================================================================
-- Pinned lists (one per project) and their items
-- =======================================================================
DEFINE TABLE pinned_list SCHEMAFULL;
DEFINE FIELD project_id ON TABLE pinned_list TYPE string;
DEFINE FIELD created_at ON TABLE pinned_list TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_pinned_list_project ON TABLE pinned_list \
    COLUMNS project_id UNIQUE;

DEFINE TABLE pinned_item SCHEMAFULL;
DEFINE FIELD pinned_list_id ON TABLE pinned_item TYPE string;
DEFINE FIELD item_kind ON TABLE pinned_item TYPE string \
    ASSERT $value IN ['chart', 'dashboard', 'space'];
DEFINE FIELD item_id ON TABLE pinned_item TYPE string;
DEFINE FIELD item_order ON TABLE pinned_item TYPE int \
    ASSERT $value >= 0;
DEFINE INDEX idx_pinned_item_unique ON TABLE pinned_item \
    COLUMNS item_kind, item_id UNIQUE;
DEFINE INDEX idx_pinned_item_order ON TABLE pinned_item \
    COLUMNS pinned_list_id, item_order UNIQUE;

-- =======================================================================
-- Schedulers (owned by a chart or a dashboard) and their targets
-- =======================================================================
DEFINE TABLE scheduler SCHEMAFULL;
DEFINE FIELD name ON TABLE scheduler TYPE string;
DEFINE FIELD message ON TABLE scheduler TYPE option<string>;
DEFINE FIELD cron ON TABLE scheduler TYPE string;
DEFINE FIELD format ON TABLE scheduler TYPE string \
    ASSERT $value IN ['csv', 'image'];
DEFINE FIELD saved_chart_id ON TABLE scheduler TYPE option<string>;
DEFINE FIELD dashboard_id ON TABLE scheduler TYPE option<string>;
DEFINE FIELD created_by ON TABLE scheduler TYPE string;
DEFINE FIELD created_at ON TABLE scheduler TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_scheduler_chart ON TABLE scheduler \
    COLUMNS saved_chart_id;

DEFINE TABLE scheduler_target SCHEMAFULL;
DEFINE FIELD scheduler_id ON TABLE scheduler_target TYPE string;
DEFINE FIELD target_type ON TABLE scheduler_target TYPE string \
    ASSERT $value IN ['slack', 'email'];
DEFINE FIELD destination ON TABLE scheduler_target TYPE string;
DEFINE FIELD position ON TABLE scheduler_target TYPE int;
DEFINE INDEX idx_scheduler_target_scheduler ON TABLE scheduler_target \
    COLUMNS scheduler_id;
";

/// Run all pending migrations against the given SurrealDB instance.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_every_table() {
        for table in [
            "project",
            "space",
            "space_member",
            "dashboard",
            "saved_chart",
            "saved_chart_version",
            "chart_view",
            "pinned_list",
            "pinned_item",
            "scheduler",
            "scheduler_target",
        ] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
