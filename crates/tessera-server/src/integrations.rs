//! Stand-ins for the messaging workspace and the delivery job queue.
//! They log what would be sent and always succeed.

use tessera_content::error::SideEffectError;
use tessera_content::{JobMaterializer, MessagingIntegration};
use tessera_core::models::scheduler::Scheduler;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMessaging;

impl MessagingIntegration for LoggingMessaging {
    async fn join_channels(
        &self,
        organization_id: Uuid,
        channels: Vec<String>,
    ) -> Result<(), SideEffectError> {
        info!(%organization_id, ?channels, "Joining messaging channels");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingJobs;

impl JobMaterializer for LoggingJobs {
    async fn generate_daily_jobs(&self, scheduler: &Scheduler) -> Result<(), SideEffectError> {
        info!(
            scheduler_id = %scheduler.id,
            cron = %scheduler.cron,
            targets = scheduler.targets.len(),
            "Generating daily delivery jobs"
        );
        Ok(())
    }
}
