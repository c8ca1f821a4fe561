//! Shared fixtures for the content service integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tessera_content::error::SideEffectError;
use tessera_content::{
    ContentConfig, JobMaterializer, MessagingIntegration, PinningService, RecordingEmitter,
    SavedChartService, SchedulerRegistrar,
};
use tessera_core::models::actor::{Actor, OrganizationRole, ProjectRole};
use tessera_core::models::chart::{ChartParent, ChartVersionSpec, CreateSavedChart};
use tessera_core::models::project::CreateProject;
use tessera_core::models::scheduler::Scheduler;
use tessera_core::models::space::{CreateSpace, SpaceVisibility};
use tessera_core::repository::{ProjectRepository, SpaceRepository};
use tessera_db::repository::{
    SurrealDashboardRepository, SurrealPinnedListRepository, SurrealProjectRepository,
    SurrealSavedChartRepository, SurrealSchedulerRepository, SurrealSpaceRepository,
};
use uuid::Uuid;

pub type ChartService = SavedChartService<
    SurrealProjectRepository<Db>,
    SurrealSavedChartRepository<Db>,
    SurrealPinnedListRepository<Db>,
    SurrealDashboardRepository<Db>,
    SurrealSpaceRepository<Db>,
    RecordingEmitter,
>;

pub type Pinning = PinningService<
    SurrealProjectRepository<Db>,
    SurrealPinnedListRepository<Db>,
    SurrealDashboardRepository<Db>,
    SurrealSpaceRepository<Db>,
    RecordingEmitter,
>;

pub type Registrar = SchedulerRegistrar<
    SurrealSavedChartRepository<Db>,
    SurrealSpaceRepository<Db>,
    SurrealSchedulerRepository<Db>,
    RecordingMessaging,
    RecordingJobs,
    RecordingEmitter,
>;

/// One organization with one project, a public space and a restricted
/// space whose only member is `editor`.
pub struct Fixture {
    pub db: Surreal<Db>,
    pub org_id: Uuid,
    pub project_id: Uuid,
    pub public_space: Uuid,
    pub restricted_space: Uuid,
    /// Project editor, member of the restricted space.
    pub editor: Actor,
    /// Project editor, not a member of the restricted space.
    pub outsider: Actor,
    /// Project viewer.
    pub viewer: Actor,
    pub events: RecordingEmitter,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        tessera_db::run_migrations(&db).await.unwrap();

        let org_id = Uuid::new_v4();
        let project_id = SurrealProjectRepository::new(db.clone())
            .create(CreateProject {
                organization_id: org_id,
                name: "Analytics".into(),
            })
            .await
            .unwrap()
            .id;

        let editor = member(org_id, project_id, ProjectRole::Editor);
        let outsider = member(org_id, project_id, ProjectRole::Editor);
        let viewer = member(org_id, project_id, ProjectRole::Viewer);

        let spaces = SurrealSpaceRepository::new(db.clone());
        let public_space = spaces
            .create(CreateSpace {
                project_id,
                name: "Shared".into(),
                visibility: SpaceVisibility::Public,
                members: vec![],
            })
            .await
            .unwrap()
            .id;
        let restricted_space = spaces
            .create(CreateSpace {
                project_id,
                name: "Finance".into(),
                visibility: SpaceVisibility::Restricted,
                members: vec![editor.user_id],
            })
            .await
            .unwrap()
            .id;

        Self {
            db,
            org_id,
            project_id,
            public_space,
            restricted_space,
            editor,
            outsider,
            viewer,
            events: RecordingEmitter::new(),
        }
    }

    pub fn spaces(&self) -> SurrealSpaceRepository<Db> {
        SurrealSpaceRepository::new(self.db.clone())
    }

    pub fn chart_service(&self) -> ChartService {
        SavedChartService::new(
            SurrealProjectRepository::new(self.db.clone()),
            SurrealSavedChartRepository::new(self.db.clone()),
            SurrealPinnedListRepository::new(self.db.clone()),
            SurrealDashboardRepository::new(self.db.clone()),
            SurrealSpaceRepository::new(self.db.clone()),
            self.events.clone(),
            ContentConfig::default(),
        )
    }

    pub fn pinning_service(&self) -> Pinning {
        PinningService::new(
            SurrealProjectRepository::new(self.db.clone()),
            SurrealPinnedListRepository::new(self.db.clone()),
            SurrealDashboardRepository::new(self.db.clone()),
            SurrealSpaceRepository::new(self.db.clone()),
            self.events.clone(),
            ContentConfig::default(),
        )
    }

    pub fn registrar(&self, messaging: RecordingMessaging, jobs: RecordingJobs) -> Registrar {
        SchedulerRegistrar::new(
            SurrealSavedChartRepository::new(self.db.clone()),
            SurrealSpaceRepository::new(self.db.clone()),
            SurrealSchedulerRepository::new(self.db.clone()),
            messaging,
            jobs,
            self.events.clone(),
            ContentConfig::default(),
        )
    }
}

pub fn member(org_id: Uuid, project_id: Uuid, role: ProjectRole) -> Actor {
    Actor::new(Uuid::new_v4())
        .in_organization(org_id, OrganizationRole::Member)
        .with_project_role(project_id, role)
}

pub fn chart_in(parent: ChartParent, name: &str) -> CreateSavedChart {
    CreateSavedChart {
        name: name.into(),
        description: None,
        parent,
        spec: ChartVersionSpec {
            table_name: "orders".into(),
            ..Default::default()
        },
    }
}

/// Messaging double that records joins and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingMessaging {
    pub joins: Arc<Mutex<Vec<(Uuid, Vec<String>)>>>,
    pub fail: bool,
}

impl RecordingMessaging {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn joins(&self) -> Vec<(Uuid, Vec<String>)> {
        self.joins.lock().unwrap().clone()
    }
}

impl MessagingIntegration for RecordingMessaging {
    async fn join_channels(
        &self,
        organization_id: Uuid,
        channels: Vec<String>,
    ) -> Result<(), SideEffectError> {
        self.joins.lock().unwrap().push((organization_id, channels));
        if self.fail {
            return Err(SideEffectError::Unavailable {
                service: "slack",
                message: "workspace unreachable".into(),
            });
        }
        Ok(())
    }
}

/// Job materializer double that records the schedulers it was given.
#[derive(Clone, Default)]
pub struct RecordingJobs {
    pub schedulers: Arc<Mutex<Vec<Uuid>>>,
    pub fail: bool,
}

impl RecordingJobs {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn schedulers(&self) -> Vec<Uuid> {
        self.schedulers.lock().unwrap().clone()
    }
}

impl JobMaterializer for RecordingJobs {
    async fn generate_daily_jobs(&self, scheduler: &Scheduler) -> Result<(), SideEffectError> {
        self.schedulers.lock().unwrap().push(scheduler.id);
        if self.fail {
            return Err(SideEffectError::Rejected {
                service: "scheduler",
                message: "queue full".into(),
            });
        }
        Ok(())
    }
}
