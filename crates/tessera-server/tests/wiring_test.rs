//! End-to-end wiring: services over an in-memory database, delivering
//! events through the queued emitter.

use std::sync::{Arc, Mutex};

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tessera_content::error::SideEffectError;
use tessera_content::{AnalyticsSink, ChannelEmitter, ContentConfig};
use tessera_core::models::actor::{Actor, OrganizationRole, ProjectRole};
use tessera_core::models::chart::{ChartParent, CreateSavedChart};
use tessera_core::models::event::AuditEvent;
use tessera_core::models::project::CreateProject;
use tessera_core::models::scheduler::{CreateScheduler, CreateSchedulerTarget, SchedulerFormat};
use tessera_core::models::space::{CreateSpace, SpaceVisibility};
use tessera_core::repository::{ProjectRepository, SpaceRepository};
use tessera_db::repository::{SurrealProjectRepository, SurrealSpaceRepository};
use tessera_server::Services;
use uuid::Uuid;

#[derive(Clone, Default)]
struct CollectingSink {
    names: Arc<Mutex<Vec<String>>>,
}

impl AnalyticsSink for CollectingSink {
    async fn track(&self, event: AuditEvent) -> Result<(), SideEffectError> {
        self.names.lock().unwrap().push(event.event);
        Ok(())
    }
}

#[tokio::test]
async fn services_deliver_events_through_the_queue() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();

    let org_id = Uuid::new_v4();
    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            organization_id: org_id,
            name: "Analytics".into(),
        })
        .await
        .unwrap();
    let space = SurrealSpaceRepository::new(db.clone())
        .create(CreateSpace {
            project_id: project.id,
            name: "Shared".into(),
            visibility: SpaceVisibility::Public,
            members: vec![],
        })
        .await
        .unwrap();
    let editor = Actor::new(Uuid::new_v4())
        .in_organization(org_id, OrganizationRole::Member)
        .with_project_role(project.id, ProjectRole::Editor);

    let sink = CollectingSink::default();
    let (events, worker) = ChannelEmitter::spawn(sink.clone(), 16);
    let services = Services::new(&db, events, &ContentConfig::default());

    let chart = services
        .charts
        .create(
            &editor,
            project.id,
            CreateSavedChart {
                name: "Weekly revenue".into(),
                description: None,
                parent: ChartParent::Space(space.id),
                spec: Default::default(),
            },
        )
        .await
        .unwrap();
    services
        .schedulers
        .create_scheduler(
            &editor,
            chart.id,
            CreateScheduler {
                name: "Monday digest".into(),
                message: None,
                cron: "0 9 * * 1".into(),
                format: SchedulerFormat::Csv,
                targets: vec![CreateSchedulerTarget::Slack {
                    channel: "#revenue".into(),
                }],
            },
        )
        .await
        .unwrap();
    let list = services
        .charts
        .toggle_pinning(&editor, chart.id)
        .await
        .unwrap()
        .pinned_list_id
        .unwrap();
    let items = services
        .pinning
        .get_pinned_items(&editor, project.id, list)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    drop(services);
    worker.await.unwrap();

    assert_eq!(
        *sink.names.lock().unwrap(),
        vec![
            "saved_chart.created".to_string(),
            "scheduler.created".to_string(),
            "pinned_list.updated".to_string(),
        ]
    );
}
