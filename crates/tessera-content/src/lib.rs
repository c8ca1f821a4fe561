//! Tessera Content: authorization-gated lifecycle of saved charts,
//! pinned lists and scheduled deliveries.
//!
//! Every service here follows the same shape: resolve the target's
//! authorization attributes, consult the capability model and the
//! [`SpaceAccessResolver`], mutate through a repository, then report the
//! post-mutation state to the [`EventEmitter`] and any post-commit
//! collaborators.

pub mod chart;
pub mod config;
pub mod cron;
pub mod error;
pub mod events;
pub mod pinning;
pub mod properties;
pub mod scheduler;
pub mod side_effects;
pub mod space_access;

pub use chart::SavedChartService;
pub use config::ContentConfig;
pub use error::{CronError, SideEffectError};
pub use events::{AnalyticsSink, ChannelEmitter, EventEmitter, RecordingEmitter, TracingSink};
pub use pinning::PinningService;
pub use scheduler::SchedulerRegistrar;
pub use side_effects::{JobMaterializer, MessagingIntegration};
pub use space_access::SpaceAccessResolver;
