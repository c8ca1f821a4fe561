//! Chart Lifecycle Manager.
//!
//! Every operation resolves the chart's (or project's) authorization
//! attributes first, checks capability and current space access, and only
//! then writes. Space access is re-evaluated on every call.

use std::collections::HashMap;

use serde_json::{Value, json};
use tessera_core::ability::{self, Action, ResourceDescriptor, ResourceKind};
use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::actor::Actor;
use tessera_core::models::chart::{
    ChartParent, ChartSummary, ChartVersionSpec, ChartViewStats, CreateSavedChart, SavedChart,
    UpdateMultipleSavedChart, UpdateSavedChart,
};
use tessera_core::models::event::AuditEvent;
use tessera_core::models::pinned_list::PinnedItemRef;
use tessera_core::models::project::Project;
use tessera_core::repository::{
    DashboardRepository, PinnedListRepository, ProjectRepository, SavedChartRepository,
    SpaceRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ContentConfig;
use crate::events::{self, EventEmitter};
use crate::properties;
use crate::space_access::SpaceAccessResolver;

/// Summary of a chart the actor may update: `update SavedChart` on its
/// project and access to its current space.
pub(crate) async fn check_update_access<C, S>(
    charts: &C,
    spaces: &SpaceAccessResolver<S>,
    actor: &Actor,
    chart_id: Uuid,
) -> TesseraResult<ChartSummary>
where
    C: SavedChartRepository,
    S: SpaceRepository,
{
    let summary = charts.get_summary(chart_id).await?;
    ability::ensure(
        actor,
        Action::Update,
        &summary.descriptor(ResourceKind::SavedChart),
    )?;
    spaces.check(actor, summary.space_id).await?;
    Ok(summary)
}

/// Saved chart service.
///
/// Generic over repository implementations so that the content layer has
/// no dependency on the database crate.
pub struct SavedChartService<Pr, C, P, D, S, E>
where
    Pr: ProjectRepository,
    C: SavedChartRepository,
    P: PinnedListRepository,
    D: DashboardRepository,
    S: SpaceRepository,
    E: EventEmitter,
{
    projects: Pr,
    charts: C,
    pins: P,
    dashboards: D,
    spaces: SpaceAccessResolver<S>,
    events: E,
    config: ContentConfig,
}

impl<Pr, C, P, D, S, E> SavedChartService<Pr, C, P, D, S, E>
where
    Pr: ProjectRepository,
    C: SavedChartRepository,
    P: PinnedListRepository,
    D: DashboardRepository,
    S: SpaceRepository,
    E: EventEmitter,
{
    pub fn new(
        projects: Pr,
        charts: C,
        pins: P,
        dashboards: D,
        spaces: S,
        events: E,
        config: ContentConfig,
    ) -> Self {
        Self {
            projects,
            charts,
            pins,
            dashboards,
            spaces: SpaceAccessResolver::new(spaces),
            events,
            config,
        }
    }

    fn emit(&self, name: &str, actor: &Actor, properties: Value) {
        self.events
            .emit(AuditEvent::new(name, actor.user_id, properties));
    }

    fn emit_version_events(&self, name: &str, actor: &Actor, chart: &SavedChart) {
        self.emit(
            name,
            actor,
            Value::Object(properties::version_properties(chart)),
        );
        for props in properties::conditional_formatting_properties(chart) {
            self.emit(events::CONDITIONAL_FORMATTING_RULE_SAVED, actor, props);
        }
    }

    /// Capability on the chart plus access to its current space.
    async fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        summary: &ChartSummary,
    ) -> TesseraResult<()> {
        ability::ensure(actor, action, &summary.descriptor(ResourceKind::SavedChart))?;
        self.spaces.check(actor, summary.space_id).await
    }

    /// Checks that `parent` is a valid home for a chart of `project` that
    /// the actor can reach. A chart must be placed in a space or on a
    /// dashboard.
    async fn check_parent(
        &self,
        actor: &Actor,
        project: &Project,
        parent: ChartParent,
    ) -> TesseraResult<()> {
        match parent {
            ChartParent::Space(space_id) => self.spaces.check(actor, Some(space_id)).await,
            ChartParent::Dashboard(dashboard_id) => {
                let dashboard = self.dashboards.get_summary(dashboard_id).await?;
                if dashboard.project_id != project.id {
                    return Err(TesseraError::invalid_input(format!(
                        "dashboard {dashboard_id} does not belong to project {}",
                        project.id
                    )));
                }
                self.spaces.check(actor, Some(dashboard.space_id)).await
            }
            ChartParent::Orphan => Err(TesseraError::invalid_input(
                "a chart must belong to a space or a dashboard",
            )),
        }
    }

    /// Create a chart at version 1.
    pub async fn create(
        &self,
        actor: &Actor,
        project_id: Uuid,
        input: CreateSavedChart,
    ) -> TesseraResult<SavedChart> {
        let project = self.projects.get_by_id(project_id).await?;
        ability::ensure(
            actor,
            Action::Create,
            &ResourceDescriptor::project(
                ResourceKind::SavedChart,
                project.organization_id,
                project.id,
            ),
        )?;
        self.check_parent(actor, &project, input.parent).await?;

        let chart = self.charts.create(project_id, actor.user_id, input).await?;

        info!(chart_id = %chart.id, %project_id, user_id = %actor.user_id, "Saved chart created");

        let mut props = properties::version_properties(&chart);
        props.insert("dashboardId".into(), json!(chart.dashboard_id()));
        self.emit(events::SAVED_CHART_CREATED, actor, Value::Object(props));
        for props in properties::conditional_formatting_properties(&chart) {
            self.emit(events::CONDITIONAL_FORMATTING_RULE_SAVED, actor, props);
        }
        Ok(chart)
    }

    /// Read a chart, recording a view.
    pub async fn get(&self, actor: &Actor, chart_id: Uuid) -> TesseraResult<SavedChart> {
        let summary = self.charts.get_summary(chart_id).await?;
        self.authorize(actor, Action::View, &summary).await?;

        let chart = self.charts.get(chart_id).await?;
        if let Err(e) = self.charts.add_view(chart_id, actor.user_id).await {
            warn!(%chart_id, error = %e, "Failed to record chart view");
        }

        self.emit(
            events::SAVED_CHART_VIEW,
            actor,
            json!({
                "savedChartId": chart.id,
                "organizationId": chart.organization_id,
                "projectId": chart.project_id,
            }),
        );
        Ok(chart)
    }

    pub async fn get_view_stats(
        &self,
        actor: &Actor,
        chart_id: Uuid,
    ) -> TesseraResult<ChartViewStats> {
        let summary = self.charts.get_summary(chart_id).await?;
        self.authorize(actor, Action::View, &summary).await?;
        self.charts.get_view_stats(chart_id).await
    }

    /// Append a version to the chart.
    pub async fn create_version(
        &self,
        actor: &Actor,
        chart_id: Uuid,
        spec: ChartVersionSpec,
    ) -> TesseraResult<SavedChart> {
        check_update_access(&self.charts, &self.spaces, actor, chart_id).await?;

        let chart = self
            .charts
            .create_version(chart_id, spec, actor.user_id)
            .await?;

        info!(
            %chart_id,
            version = chart.version,
            user_id = %actor.user_id,
            "Chart version created"
        );
        self.emit_version_events(events::SAVED_CHART_VERSION_CREATED, actor, &chart);
        Ok(chart)
    }

    /// Update name, description or placement.
    pub async fn update(
        &self,
        actor: &Actor,
        chart_id: Uuid,
        input: UpdateSavedChart,
    ) -> TesseraResult<SavedChart> {
        let before = check_update_access(&self.charts, &self.spaces, actor, chart_id).await?;

        if let Some(parent) = input.parent {
            let project = self.projects.get_by_id(before.project_id).await?;
            self.check_parent(actor, &project, parent).await?;
        }

        let chart = self
            .charts
            .update(chart_id, input, actor.user_id)
            .await?;

        self.emit(
            events::SAVED_CHART_UPDATED,
            actor,
            json!({
                "projectId": chart.project_id,
                "savedQueryId": chart.id,
                "dashboardId": chart.dashboard_id(),
            }),
        );

        // Detached from its dashboard back into a space.
        if let (Some(old_dashboard), None) = (before.parent.dashboard_id(), chart.dashboard_id()) {
            self.emit(
                events::DASHBOARD_CHART_MOVED,
                actor,
                json!({
                    "projectId": chart.project_id,
                    "savedQueryId": chart.id,
                    "dashboardId": old_dashboard,
                    "spaceId": chart.space_id,
                }),
            );
        }
        Ok(chart)
    }

    /// Rename and move several charts of one project at once. Every chart
    /// is authorized before anything is written; one denial rejects the
    /// whole batch.
    pub async fn update_multiple(
        &self,
        actor: &Actor,
        project_id: Uuid,
        inputs: Vec<UpdateMultipleSavedChart>,
    ) -> TesseraResult<Vec<SavedChart>> {
        let project = self.projects.get_by_id(project_id).await?;
        let project_descriptor = ResourceDescriptor::project(
            ResourceKind::SavedChart,
            project.organization_id,
            project.id,
        );

        let mut access = HashMap::new();
        for input in &inputs {
            let summary = self.charts.get_summary(input.id).await?;
            if summary.project_id != project_id {
                return Err(TesseraError::not_found("saved_chart", input.id));
            }

            ability::ensure(
                actor,
                Action::Update,
                &project_descriptor.clone().in_space(Some(input.space_id)),
            )?;

            let Some(current_space) = summary.space_id else {
                return Err(TesseraError::forbidden(format!(
                    "saved chart {} has no space",
                    input.id
                )));
            };
            for space_id in [current_space, input.space_id] {
                if !self
                    .spaces
                    .has_access_cached(actor, space_id, &mut access)
                    .await
                {
                    return Err(TesseraError::forbidden(format!(
                        "You don't have access to space {space_id}"
                    )));
                }
            }
        }

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let charts = self
            .charts
            .update_multiple(inputs, actor.user_id)
            .await?;

        let ids: Vec<Uuid> = charts.iter().map(|c| c.id).collect();
        info!(%project_id, count = ids.len(), user_id = %actor.user_id, "Saved charts updated");
        self.emit(
            events::SAVED_CHART_UPDATED_MULTIPLE,
            actor,
            json!({
                "savedChartIds": ids,
                "projectId": project_id,
            }),
        );
        Ok(charts)
    }

    /// Copy a chart's latest version into a new chart of the same project.
    pub async fn duplicate(
        &self,
        actor: &Actor,
        project_id: Uuid,
        chart_id: Uuid,
    ) -> TesseraResult<SavedChart> {
        let summary = self.charts.get_summary(chart_id).await?;
        if summary.project_id != project_id {
            return Err(TesseraError::not_found("saved_chart", chart_id));
        }
        self.authorize(actor, Action::Create, &summary).await?;

        let source = self.charts.get(chart_id).await?;
        let input = CreateSavedChart {
            name: format!("{}{}", self.config.duplicate_name_prefix, source.name),
            description: source.description,
            // A dashboard chart stays on the dashboard; a space chart keeps
            // its space.
            parent: source.parent,
            spec: source.spec,
        };
        let chart = self.charts.create(project_id, actor.user_id, input).await?;

        info!(chart_id = %chart.id, source_id = %chart_id, "Saved chart duplicated");

        let base = properties::version_properties(&chart);
        let mut created = base.clone();
        created.insert("duplicated".into(), json!(true));
        created.insert("dashboardId".into(), json!(chart.dashboard_id()));
        self.emit(events::SAVED_CHART_CREATED, actor, Value::Object(created));

        let mut lineage = base;
        lineage.insert("newSavedQueryId".into(), json!(chart.id));
        lineage.insert("duplicateOfSavedQueryId".into(), json!(chart_id));
        self.emit(events::DUPLICATED_CHART_CREATED, actor, Value::Object(lineage));

        Ok(chart)
    }

    /// Delete a chart with its versions, schedulers and pinned-list entry.
    pub async fn delete(&self, actor: &Actor, chart_id: Uuid) -> TesseraResult<SavedChart> {
        let summary = self.charts.get_summary(chart_id).await?;
        self.authorize(actor, Action::Delete, &summary).await?;

        let deleted = self.charts.delete(chart_id).await?;

        info!(%chart_id, user_id = %actor.user_id, "Saved chart deleted");
        self.emit(
            events::SAVED_CHART_DELETED,
            actor,
            json!({
                "savedQueryId": deleted.id,
                "projectId": deleted.project_id,
            }),
        );
        Ok(deleted)
    }

    /// Pin or unpin the chart on its project's list. Returns the chart as
    /// it is after the toggle.
    pub async fn toggle_pinning(&self, actor: &Actor, chart_id: Uuid) -> TesseraResult<SavedChart> {
        let summary = self.charts.get_summary(chart_id).await?;
        ability::ensure(
            actor,
            Action::Manage,
            &ResourceDescriptor::project(
                ResourceKind::PinnedItems,
                summary.organization_id,
                summary.project_id,
            ),
        )?;
        self.spaces.check(actor, summary.space_id).await?;

        let (outcome, list) = self
            .pins
            .toggle(summary.project_id, PinnedItemRef::chart(chart_id))
            .await?;

        info!(%chart_id, ?outcome, pinned_list_id = %list.id, "Chart pinning toggled");
        self.emit(
            events::PINNED_LIST_UPDATED,
            actor,
            properties::pinned_list_properties(
                summary.organization_id,
                &list,
                &self.config.pinned_list_location,
            ),
        );

        self.charts.get(chart_id).await
    }
}
