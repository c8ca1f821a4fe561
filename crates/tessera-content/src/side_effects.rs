//! Post-commit side effects of scheduler creation.
//!
//! The steps run after the scheduler row is committed, outside any lock,
//! one after the other. A failing step is retried up to the configured
//! number of attempts, then logged; it never rolls back the scheduler and
//! never fails the caller.

use std::future::Future;

use tessera_core::models::scheduler::Scheduler;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SideEffectError;

/// Messaging workspace of an organization (e.g. Slack).
pub trait MessagingIntegration: Send + Sync {
    /// Make sure the organization's bot has joined every channel.
    /// Already-joined channels are not an error.
    fn join_channels(
        &self,
        organization_id: Uuid,
        channels: Vec<String>,
    ) -> impl Future<Output = Result<(), SideEffectError>> + Send;
}

/// Turns a scheduler into concrete delivery jobs.
pub trait JobMaterializer: Send + Sync {
    fn generate_daily_jobs(
        &self,
        scheduler: &Scheduler,
    ) -> impl Future<Output = Result<(), SideEffectError>> + Send;
}

/// One best-effort step after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCommitStep {
    JoinChannels {
        organization_id: Uuid,
        channels: Vec<String>,
    },
    GenerateJobs,
}

impl PostCommitStep {
    fn name(&self) -> &'static str {
        match self {
            PostCommitStep::JoinChannels { .. } => "join_channels",
            PostCommitStep::GenerateJobs => "generate_jobs",
        }
    }
}

/// Steps owed for a newly created scheduler, in execution order.
pub fn steps_for(organization_id: Uuid, scheduler: &Scheduler) -> Vec<PostCommitStep> {
    let mut steps = Vec::with_capacity(2);
    let channels = scheduler.slack_channels();
    if !channels.is_empty() {
        steps.push(PostCommitStep::JoinChannels {
            organization_id,
            channels,
        });
    }
    steps.push(PostCommitStep::GenerateJobs);
    steps
}

/// Execute `steps` against the collaborators. Returns the steps that
/// still failed after the last attempt.
pub async fn run<M, J>(
    messaging: &M,
    jobs: &J,
    scheduler: &Scheduler,
    steps: Vec<PostCommitStep>,
    attempts: u32,
) -> Vec<PostCommitStep>
where
    M: MessagingIntegration,
    J: JobMaterializer,
{
    let attempts = attempts.max(1);
    let mut failed = Vec::new();

    for step in steps {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match &step {
                PostCommitStep::JoinChannels {
                    organization_id,
                    channels,
                } => {
                    messaging
                        .join_channels(*organization_id, channels.clone())
                        .await
                }
                PostCommitStep::GenerateJobs => jobs.generate_daily_jobs(scheduler).await,
            };

            match result {
                Ok(()) => {
                    debug!(
                        scheduler_id = %scheduler.id,
                        step = step.name(),
                        "Post-commit step done"
                    );
                    break;
                }
                Err(e) if attempt < attempts => {
                    debug!(
                        scheduler_id = %scheduler.id,
                        step = step.name(),
                        attempt,
                        error = %e,
                        "Post-commit step failed, retrying"
                    );
                }
                Err(e) => {
                    warn!(
                        scheduler_id = %scheduler.id,
                        step = step.name(),
                        attempts = attempt,
                        error = %e,
                        "Post-commit step failed"
                    );
                    failed.push(step);
                    break;
                }
            }
        }
    }
    failed
}
