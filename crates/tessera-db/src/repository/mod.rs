//! SurrealDB repository implementations.

mod dashboard;
mod pinned_list;
mod project;
mod saved_chart;
mod scheduler;
mod space;

pub use dashboard::SurrealDashboardRepository;
pub use pinned_list::SurrealPinnedListRepository;
pub use project::SurrealProjectRepository;
pub use saved_chart::SurrealSavedChartRepository;
pub use scheduler::SurrealSchedulerRepository;
pub use space::SurrealSpaceRepository;
