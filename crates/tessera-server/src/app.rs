//! Service wiring over a single database handle.

use surrealdb::{Connection, Surreal};
use tessera_content::{
    ChannelEmitter, ContentConfig, PinningService, SavedChartService, SchedulerRegistrar,
};
use tessera_db::repository::{
    SurrealDashboardRepository, SurrealPinnedListRepository, SurrealProjectRepository,
    SurrealSavedChartRepository, SurrealSchedulerRepository, SurrealSpaceRepository,
};

use crate::integrations::{LoggingJobs, LoggingMessaging};

pub type Charts<C> = SavedChartService<
    SurrealProjectRepository<C>,
    SurrealSavedChartRepository<C>,
    SurrealPinnedListRepository<C>,
    SurrealDashboardRepository<C>,
    SurrealSpaceRepository<C>,
    ChannelEmitter,
>;

pub type Pinning<C> = PinningService<
    SurrealProjectRepository<C>,
    SurrealPinnedListRepository<C>,
    SurrealDashboardRepository<C>,
    SurrealSpaceRepository<C>,
    ChannelEmitter,
>;

pub type Schedulers<C> = SchedulerRegistrar<
    SurrealSavedChartRepository<C>,
    SurrealSpaceRepository<C>,
    SurrealSchedulerRepository<C>,
    LoggingMessaging,
    LoggingJobs,
    ChannelEmitter,
>;

/// The content services, sharing one connection and one event queue.
pub struct Services<C: Connection> {
    pub charts: Charts<C>,
    pub pinning: Pinning<C>,
    pub schedulers: Schedulers<C>,
}

impl<C: Connection> Services<C> {
    pub fn new(db: &Surreal<C>, events: ChannelEmitter, config: &ContentConfig) -> Self {
        Self {
            charts: SavedChartService::new(
                SurrealProjectRepository::new(db.clone()),
                SurrealSavedChartRepository::new(db.clone()),
                SurrealPinnedListRepository::new(db.clone()),
                SurrealDashboardRepository::new(db.clone()),
                SurrealSpaceRepository::new(db.clone()),
                events.clone(),
                config.clone(),
            ),
            pinning: PinningService::new(
                SurrealProjectRepository::new(db.clone()),
                SurrealPinnedListRepository::new(db.clone()),
                SurrealDashboardRepository::new(db.clone()),
                SurrealSpaceRepository::new(db.clone()),
                events.clone(),
                config.clone(),
            ),
            schedulers: SchedulerRegistrar::new(
                SurrealSavedChartRepository::new(db.clone()),
                SurrealSpaceRepository::new(db.clone()),
                SurrealSchedulerRepository::new(db.clone()),
                LoggingMessaging,
                LoggingJobs,
                events,
                config.clone(),
            ),
        }
    }
}
