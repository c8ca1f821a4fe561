//! Pinned List Manager: the project-scoped pinning surface.
//!
//! Charts are pinned through
//! [`SavedChartService::toggle_pinning`](crate::chart::SavedChartService::toggle_pinning);
//! dashboards and spaces are pinned here. Ordering rules live in
//! [`PinnedList`]; the repository applies them atomically.

use tessera_core::ability::{self, Action, ResourceDescriptor, ResourceKind};
use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::actor::Actor;
use tessera_core::models::event::AuditEvent;
use tessera_core::models::pinned_list::{PinnedItem, PinnedItemKind, PinnedItemRef, PinnedList};
use tessera_core::models::project::Project;
use tessera_core::repository::{
    DashboardRepository, PinnedListRepository, ProjectRepository, SpaceRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::config::ContentConfig;
use crate::events::{self, EventEmitter};
use crate::properties;
use crate::space_access::SpaceAccessResolver;

/// Authorization attributes of a pinnable item.
struct Placement {
    organization_id: Uuid,
    project_id: Uuid,
    space_id: Option<Uuid>,
}

pub struct PinningService<Pr, P, D, S, E>
where
    Pr: ProjectRepository,
    P: PinnedListRepository,
    D: DashboardRepository,
    S: SpaceRepository,
    E: EventEmitter,
{
    projects: Pr,
    pins: P,
    dashboards: D,
    spaces: SpaceAccessResolver<S>,
    events: E,
    config: ContentConfig,
}

impl<Pr, P, D, S, E> PinningService<Pr, P, D, S, E>
where
    Pr: ProjectRepository,
    P: PinnedListRepository,
    D: DashboardRepository,
    S: SpaceRepository,
    E: EventEmitter,
{
    pub fn new(
        projects: Pr,
        pins: P,
        dashboards: D,
        spaces: S,
        events: E,
        config: ContentConfig,
    ) -> Self {
        Self {
            projects,
            pins,
            dashboards,
            spaces: SpaceAccessResolver::new(spaces),
            events,
            config,
        }
    }

    fn descriptor(project: &Project) -> ResourceDescriptor {
        ResourceDescriptor::project(ResourceKind::PinnedItems, project.organization_id, project.id)
    }

    /// The list, provided it belongs to `project_id`.
    async fn project_list(&self, project_id: Uuid, list_id: Uuid) -> TesseraResult<PinnedList> {
        let list = self.pins.get(list_id).await?;
        if list.project_id != project_id {
            return Err(TesseraError::not_found("pinned_list", list_id));
        }
        Ok(list)
    }

    fn emit_snapshot(&self, actor: &Actor, organization_id: Uuid, list: &PinnedList) {
        self.events.emit(AuditEvent::new(
            events::PINNED_LIST_UPDATED,
            actor.user_id,
            properties::pinned_list_properties(
                organization_id,
                list,
                &self.config.pinned_list_location,
            ),
        ));
    }

    /// Items of a project's pinned list, ordered.
    pub async fn get_pinned_items(
        &self,
        actor: &Actor,
        project_id: Uuid,
        list_id: Uuid,
    ) -> TesseraResult<Vec<PinnedItem>> {
        let project = self.projects.get_by_id(project_id).await?;
        ability::ensure(actor, Action::View, &Self::descriptor(&project))?;

        Ok(self.project_list(project_id, list_id).await?.items)
    }

    /// Replace the whole ordering. `order` must be a permutation of the
    /// current membership.
    pub async fn update_pinned_items_order(
        &self,
        actor: &Actor,
        project_id: Uuid,
        list_id: Uuid,
        order: Vec<PinnedItemRef>,
    ) -> TesseraResult<Vec<PinnedItem>> {
        let project = self.projects.get_by_id(project_id).await?;
        ability::ensure(actor, Action::Manage, &Self::descriptor(&project))?;
        self.project_list(project_id, list_id).await?;

        let list = self.pins.reorder(list_id, order).await?;

        info!(pinned_list_id = %list_id, user_id = %actor.user_id, "Pinned items reordered");
        self.emit_snapshot(actor, project.organization_id, &list);
        Ok(list.items)
    }

    async fn placement(&self, item: PinnedItemRef) -> TesseraResult<Placement> {
        match item.kind {
            PinnedItemKind::Dashboard => {
                let dashboard = self.dashboards.get_summary(item.id).await?;
                Ok(Placement {
                    organization_id: dashboard.organization_id,
                    project_id: dashboard.project_id,
                    space_id: Some(dashboard.space_id),
                })
            }
            PinnedItemKind::Space => {
                let space = self.spaces.summary(item.id).await?;
                Ok(Placement {
                    organization_id: space.organization_id,
                    project_id: space.project_id,
                    space_id: Some(space.id),
                })
            }
            PinnedItemKind::Chart => Err(TesseraError::invalid_input(
                "charts are pinned through the saved chart service",
            )),
        }
    }

    /// Pin or unpin a dashboard or space on its project's list. Returns
    /// the resulting list.
    pub async fn toggle_pinning(
        &self,
        actor: &Actor,
        item: PinnedItemRef,
    ) -> TesseraResult<PinnedList> {
        let placement = self.placement(item).await?;
        ability::ensure(
            actor,
            Action::Manage,
            &ResourceDescriptor::project(
                ResourceKind::PinnedItems,
                placement.organization_id,
                placement.project_id,
            ),
        )?;
        self.spaces.check(actor, placement.space_id).await?;

        let (outcome, list) = self.pins.toggle(placement.project_id, item).await?;

        info!(
            item_kind = item.kind.as_str(),
            item_id = %item.id,
            ?outcome,
            pinned_list_id = %list.id,
            "Pinning toggled"
        );
        self.emit_snapshot(actor, placement.organization_id, &list);
        Ok(list)
    }
}
