//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations that mutate a
//! pinned list or append a chart version must serialize concurrent
//! writers to the same list or chart.

use uuid::Uuid;

use crate::error::TesseraResult;
use crate::models::{
    chart::{
        ChartSummary, ChartVersionSpec, ChartViewStats, CreateSavedChart, SavedChart,
        UpdateMultipleSavedChart, UpdateSavedChart,
    },
    dashboard::{CreateDashboard, DashboardSummary},
    pinned_list::{PinToggle, PinnedItemRef, PinnedList},
    project::{CreateProject, Project},
    space::{CreateSpace, Space, SpaceSummary, SpaceVisibility},
    scheduler::{CreateScheduler, Scheduler, SchedulerOwner},
};

// ---------------------------------------------------------------------------
// Projects, spaces and dashboards
// ---------------------------------------------------------------------------

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject) -> impl Future<Output = TesseraResult<Project>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TesseraResult<Project>> + Send;
}

pub trait SpaceRepository: Send + Sync {
    fn create(&self, input: CreateSpace) -> impl Future<Output = TesseraResult<Space>> + Send;
    /// Visibility and current members, read fresh on every call.
    fn get_space_summary(
        &self,
        space_id: Uuid,
    ) -> impl Future<Output = TesseraResult<SpaceSummary>> + Send;
    fn set_visibility(
        &self,
        space_id: Uuid,
        visibility: SpaceVisibility,
    ) -> impl Future<Output = TesseraResult<()>> + Send;
    fn add_member(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<()>> + Send;
    fn remove_member(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<()>> + Send;
    fn delete(&self, space_id: Uuid) -> impl Future<Output = TesseraResult<()>> + Send;
}

pub trait DashboardRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDashboard,
    ) -> impl Future<Output = TesseraResult<DashboardSummary>> + Send;
    fn get_summary(
        &self,
        dashboard_id: Uuid,
    ) -> impl Future<Output = TesseraResult<DashboardSummary>> + Send;
}

// ---------------------------------------------------------------------------
// Saved charts
// ---------------------------------------------------------------------------

pub trait SavedChartRepository: Send + Sync {
    /// Authorization attributes of a chart. `NotFound` if it does not exist.
    fn get_summary(&self, id: Uuid) -> impl Future<Output = TesseraResult<ChartSummary>> + Send;
    /// The chart with its latest version.
    fn get(&self, id: Uuid) -> impl Future<Output = TesseraResult<SavedChart>> + Send;
    /// Persist a new chart at version 1.
    fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: CreateSavedChart,
    ) -> impl Future<Output = TesseraResult<SavedChart>> + Send;
    /// Append a version. Concurrent calls on one chart yield strictly
    /// increasing version numbers.
    fn create_version(
        &self,
        id: Uuid,
        spec: ChartVersionSpec,
        created_by: Uuid,
    ) -> impl Future<Output = TesseraResult<SavedChart>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSavedChart,
        updated_by: Uuid,
    ) -> impl Future<Output = TesseraResult<SavedChart>> + Send;
    /// Apply every entry in one transaction; either all charts change or
    /// none do.
    fn update_multiple(
        &self,
        inputs: Vec<UpdateMultipleSavedChart>,
        updated_by: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<SavedChart>>> + Send;
    /// Delete the chart, its versions, its schedulers with their targets,
    /// and its pinned-list membership. Returns the chart as it was.
    fn delete(&self, id: Uuid) -> impl Future<Output = TesseraResult<SavedChart>> + Send;
    fn add_view(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<()>> + Send;
    fn get_view_stats(
        &self,
        id: Uuid,
    ) -> impl Future<Output = TesseraResult<ChartViewStats>> + Send;
}

// ---------------------------------------------------------------------------
// Pinned lists
// ---------------------------------------------------------------------------

pub trait PinnedListRepository: Send + Sync {
    /// The project's list, if one has been created.
    fn get_by_project(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Option<PinnedList>>> + Send;
    /// `NotFound` if the list does not exist.
    fn get(&self, list_id: Uuid) -> impl Future<Output = TesseraResult<PinnedList>> + Send;
    /// Atomically pin or unpin an item on the project's list, creating the
    /// list on first pin. Returns the outcome and the resulting list.
    fn toggle(
        &self,
        project_id: Uuid,
        item: PinnedItemRef,
    ) -> impl Future<Output = TesseraResult<(PinToggle, PinnedList)>> + Send;
    /// Atomically replace the ordering. `InvalidOrder` if `order` is not
    /// a permutation of the current membership.
    fn reorder(
        &self,
        list_id: Uuid,
        order: Vec<PinnedItemRef>,
    ) -> impl Future<Output = TesseraResult<PinnedList>> + Send;
}

// ---------------------------------------------------------------------------
// Schedulers
// ---------------------------------------------------------------------------

pub trait SchedulerRepository: Send + Sync {
    /// Persist a scheduler and its targets together.
    fn create_scheduler(
        &self,
        owner: SchedulerOwner,
        created_by: Uuid,
        input: CreateScheduler,
    ) -> impl Future<Output = TesseraResult<Scheduler>> + Send;
    fn get_chart_schedulers(
        &self,
        chart_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<Scheduler>>> + Send;
}
