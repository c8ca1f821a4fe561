//! Integration tests for the Scheduler repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tessera_core::models::scheduler::{
    CreateScheduler, CreateSchedulerTarget, SchedulerFormat, SchedulerOwner, SchedulerTarget,
};
use tessera_core::repository::SchedulerRepository;
use tessera_db::repository::SurrealSchedulerRepository;
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    db
}

fn weekly(targets: Vec<CreateSchedulerTarget>) -> CreateScheduler {
    CreateScheduler {
        name: "Weekly digest".into(),
        message: Some("Numbers are in".into()),
        cron: "0 9 * * 1".into(),
        format: SchedulerFormat::Image,
        targets,
    }
}

#[tokio::test]
async fn create_scheduler_with_targets() {
    let db = setup().await;
    let repo = SurrealSchedulerRepository::new(db);
    let chart_id = Uuid::new_v4();
    let user = Uuid::new_v4();

    let scheduler = repo
        .create_scheduler(
            SchedulerOwner::Chart(chart_id),
            user,
            weekly(vec![
                CreateSchedulerTarget::Slack {
                    channel: "C42".into(),
                },
                CreateSchedulerTarget::Email {
                    recipient: "team@example.com".into(),
                },
            ]),
        )
        .await
        .unwrap();

    assert_eq!(scheduler.owner, SchedulerOwner::Chart(chart_id));
    assert_eq!(scheduler.created_by, user);
    assert_eq!(scheduler.format, SchedulerFormat::Image);
    assert_eq!(scheduler.message.as_deref(), Some("Numbers are in"));
    assert_eq!(scheduler.targets.len(), 2);
    assert!(matches!(
        &scheduler.targets[0],
        SchedulerTarget::Slack { channel, .. } if channel == "C42"
    ));
    assert!(matches!(
        &scheduler.targets[1],
        SchedulerTarget::Email { recipient, .. } if recipient == "team@example.com"
    ));
}

#[tokio::test]
async fn chart_schedulers_are_listed_per_chart() {
    let db = setup().await;
    let repo = SurrealSchedulerRepository::new(db);
    let chart_id = Uuid::new_v4();
    let other_chart = Uuid::new_v4();
    let user = Uuid::new_v4();

    let first = repo
        .create_scheduler(SchedulerOwner::Chart(chart_id), user, weekly(vec![]))
        .await
        .unwrap();
    let second = repo
        .create_scheduler(SchedulerOwner::Chart(chart_id), user, weekly(vec![]))
        .await
        .unwrap();
    repo.create_scheduler(SchedulerOwner::Chart(other_chart), user, weekly(vec![]))
        .await
        .unwrap();
    repo.create_scheduler(SchedulerOwner::Dashboard(chart_id), user, weekly(vec![]))
        .await
        .unwrap();

    let listed = repo.get_chart_schedulers(chart_id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[tokio::test]
async fn chart_without_schedulers_lists_nothing() {
    let db = setup().await;
    let repo = SurrealSchedulerRepository::new(db);

    let listed = repo.get_chart_schedulers(Uuid::new_v4()).await.unwrap();
    assert!(listed.is_empty());
}
