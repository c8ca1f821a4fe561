//! Scheduler Registrar.
//!
//! Creation validates everything before the scheduler is persisted. Once
//! it is committed, the event and the post-commit steps are best-effort:
//! their failures are logged and the scheduler stays.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::actor::Actor;
use tessera_core::models::event::AuditEvent;
use tessera_core::models::scheduler::{
    CreateScheduler, CreateSchedulerTarget, Scheduler, SchedulerOwner,
};
use tessera_core::repository::{SavedChartRepository, SchedulerRepository, SpaceRepository};
use tracing::info;
use uuid::Uuid;

use crate::chart::check_update_access;
use crate::config::ContentConfig;
use crate::cron;
use crate::events::{self, EventEmitter};
use crate::properties;
use crate::side_effects::{self, JobMaterializer, MessagingIntegration};
use crate::space_access::SpaceAccessResolver;

fn validate(input: &CreateScheduler) -> TesseraResult<()> {
    if input.name.trim().is_empty() {
        return Err(TesseraError::invalid_input("scheduler name must not be empty"));
    }
    cron::validate(&input.cron)?;

    for target in &input.targets {
        match target {
            CreateSchedulerTarget::Slack { channel } if channel.trim().is_empty() => {
                return Err(TesseraError::invalid_input("slack channel must not be empty"));
            }
            CreateSchedulerTarget::Email { recipient } if !is_email(recipient) => {
                return Err(TesseraError::invalid_input(format!(
                    "invalid email recipient: {recipient}"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub struct SchedulerRegistrar<C, S, R, M, J, E>
where
    C: SavedChartRepository,
    S: SpaceRepository,
    R: SchedulerRepository,
    M: MessagingIntegration,
    J: JobMaterializer,
    E: EventEmitter,
{
    charts: C,
    spaces: SpaceAccessResolver<S>,
    schedulers: R,
    messaging: M,
    jobs: J,
    events: E,
    config: ContentConfig,
}

impl<C, S, R, M, J, E> SchedulerRegistrar<C, S, R, M, J, E>
where
    C: SavedChartRepository,
    S: SpaceRepository,
    R: SchedulerRepository,
    M: MessagingIntegration,
    J: JobMaterializer,
    E: EventEmitter,
{
    pub fn new(
        charts: C,
        spaces: S,
        schedulers: R,
        messaging: M,
        jobs: J,
        events: E,
        config: ContentConfig,
    ) -> Self {
        Self {
            charts,
            spaces: SpaceAccessResolver::new(spaces),
            schedulers,
            messaging,
            jobs,
            events,
            config,
        }
    }

    /// Schedule deliveries of a chart.
    pub async fn create_scheduler(
        &self,
        actor: &Actor,
        chart_id: Uuid,
        input: CreateScheduler,
    ) -> TesseraResult<Scheduler> {
        let Some(organization_id) = actor.organization_id() else {
            return Err(TesseraError::invalid_input(
                "user is not part of an organization",
            ));
        };
        let summary = check_update_access(&self.charts, &self.spaces, actor, chart_id).await?;
        validate(&input)?;

        let scheduler = self
            .schedulers
            .create_scheduler(SchedulerOwner::Chart(chart_id), actor.user_id, input)
            .await?;

        info!(
            scheduler_id = %scheduler.id,
            %chart_id,
            user_id = %actor.user_id,
            "Scheduler created"
        );

        let cron_string =
            cron::describe(&scheduler.cron).unwrap_or_else(|| scheduler.cron.clone());
        self.events.emit(AuditEvent::new(
            events::SCHEDULER_CREATED,
            actor.user_id,
            properties::scheduler_properties(
                summary.organization_id,
                summary.project_id,
                &scheduler,
                &cron_string,
            ),
        ));

        let steps = side_effects::steps_for(organization_id, &scheduler);
        side_effects::run(
            &self.messaging,
            &self.jobs,
            &scheduler,
            steps,
            self.config.side_effect_attempts,
        )
        .await;

        Ok(scheduler)
    }

    /// The chart's schedulers with their targets. Requires the same
    /// access as updating the chart.
    pub async fn get_schedulers(
        &self,
        actor: &Actor,
        chart_id: Uuid,
    ) -> TesseraResult<Vec<Scheduler>> {
        check_update_access(&self.charts, &self.spaces, actor, chart_id).await?;
        self.schedulers.get_chart_schedulers(chart_id).await
    }
}
