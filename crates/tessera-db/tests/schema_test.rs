//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn fresh() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db
}

#[tokio::test]
async fn migrations_define_the_v1_schema() {
    let db = fresh().await;
    tessera_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR DB should return a value"));

    for table in [
        "project",
        "space_member",
        "dashboard",
        "saved_chart_version",
        "chart_view",
        "pinned_item",
        "scheduler_target",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = fresh().await;
    tessera_db::run_migrations(&db).await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn raw_v1_ddl_applies_on_its_own() {
    let db = fresh().await;
    db.query(tessera_db::schema_v1())
        .await
        .unwrap()
        .check()
        .unwrap();

    db.query(
        "CREATE pinned_list SET project_id = 'p1'; \
         CREATE pinned_item SET pinned_list_id = 'l1', item_kind = 'chart', \
         item_id = 'c1', item_order = 0",
    )
    .await
    .unwrap()
    .check()
    .unwrap();
}

#[tokio::test]
async fn chart_versions_are_unique_per_chart() {
    let db = fresh().await;
    tessera_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE saved_chart_version SET chart_id = $chart, version = 1, \
                  spec = {}, created_by = 'u1'";
    db.query(insert)
        .bind(("chart", "c1"))
        .await
        .unwrap()
        .check()
        .unwrap();

    let duplicate = db
        .query(insert)
        .bind(("chart", "c1"))
        .await
        .unwrap()
        .check();
    assert!(duplicate.is_err(), "second version 1 of c1 should fail");

    db.query(insert)
        .bind(("chart", "c2"))
        .await
        .unwrap()
        .check()
        .unwrap();
}

#[tokio::test]
async fn an_item_sits_in_one_list_only() {
    let db = fresh().await;
    tessera_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE pinned_item SET pinned_list_id = $list, item_kind = 'space', \
                  item_id = 's1', item_order = 0";
    db.query(insert)
        .bind(("list", "l1"))
        .await
        .unwrap()
        .check()
        .unwrap();

    let elsewhere = db
        .query(insert)
        .bind(("list", "l2"))
        .await
        .unwrap()
        .check();
    assert!(elsewhere.is_err(), "s1 is already pinned in l1");
}
