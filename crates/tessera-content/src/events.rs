//! Audit event emission.
//!
//! Services hand every event to an [`EventEmitter`], which must return
//! immediately and never fail. [`ChannelEmitter`] queues events for a
//! background worker that forwards them, in emission order, to an
//! [`AnalyticsSink`]; delivery failures are logged and dropped.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tessera_core::models::event::AuditEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SideEffectError;

pub const SAVED_CHART_CREATED: &str = "saved_chart.created";
pub const SAVED_CHART_UPDATED: &str = "saved_chart.updated";
pub const SAVED_CHART_UPDATED_MULTIPLE: &str = "saved_chart.updated_multiple";
pub const SAVED_CHART_DELETED: &str = "saved_chart.deleted";
pub const SAVED_CHART_VIEW: &str = "saved_chart.view";
pub const SAVED_CHART_VERSION_CREATED: &str = "saved_chart_version.created";
pub const CONDITIONAL_FORMATTING_RULE_SAVED: &str = "conditional_formatting_rule.saved";
pub const DASHBOARD_CHART_MOVED: &str = "dashboard_chart.moved";
pub const DUPLICATED_CHART_CREATED: &str = "duplicated_chart_created";
pub const PINNED_LIST_UPDATED: &str = "pinned_list.updated";
pub const SCHEDULER_CREATED: &str = "scheduler.created";

/// Fire-and-forget event emission.
pub trait EventEmitter: Send + Sync {
    /// Queue `event` for delivery. Must not block or panic.
    fn emit(&self, event: AuditEvent);
}

/// Destination of delivered events (an analytics or metrics backend).
pub trait AnalyticsSink: Send + Sync + 'static {
    fn track(&self, event: AuditEvent) -> impl Future<Output = Result<(), SideEffectError>> + Send;
}

/// Emitter backed by a bounded queue and a delivery worker task.
///
/// The worker stops once every clone of the emitter has been dropped and
/// the queue has drained.
#[derive(Clone)]
pub struct ChannelEmitter {
    sender: mpsc::Sender<AuditEvent>,
}

impl ChannelEmitter {
    /// Start the delivery worker on the current runtime.
    pub fn spawn<S: AnalyticsSink>(sink: S, buffer: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<AuditEvent>(buffer.max(1));

        let worker = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let name = event.event.clone();
                if let Err(e) = sink.track(event).await {
                    warn!(event = %name, error = %e, "Failed to deliver audit event");
                }
            }
            debug!("Event delivery worker stopped");
        });

        (Self { sender }, worker)
    }
}

impl EventEmitter for ChannelEmitter {
    fn emit(&self, event: AuditEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = %event.event, "Event queue full, dropping audit event");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(event = %event.event, "Event worker stopped, dropping audit event");
            }
        }
    }
}

/// Sink that writes each event to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    async fn track(&self, event: AuditEvent) -> Result<(), SideEffectError> {
        info!(
            event = %event.event,
            user_id = %event.user_id,
            properties = %event.properties,
            "Audit event"
        );
        Ok(())
    }
}

/// Emitter that keeps every event in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of the recorded events, in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }

    /// The first recorded event with the given name.
    pub fn find(&self, name: &str) -> Option<AuditEvent> {
        self.events().into_iter().find(|e| e.event == name)
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct CollectingSink {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl AnalyticsSink for CollectingSink {
        async fn track(&self, event: AuditEvent) -> Result<(), SideEffectError> {
            self.seen.lock().unwrap().push(event.event);
            Ok(())
        }
    }

    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        async fn track(&self, _event: AuditEvent) -> Result<(), SideEffectError> {
            Err(SideEffectError::Unavailable {
                service: "analytics",
                message: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn channel_emitter_delivers_in_order() {
        let sink = CollectingSink::default();
        let (emitter, worker) = ChannelEmitter::spawn(sink.clone(), 16);
        let user = Uuid::new_v4();

        emitter.emit(AuditEvent::new(SAVED_CHART_CREATED, user, json!({})));
        emitter.emit(AuditEvent::new(CONDITIONAL_FORMATTING_RULE_SAVED, user, json!({})));
        emitter.emit(AuditEvent::new(CONDITIONAL_FORMATTING_RULE_SAVED, user, json!({})));
        drop(emitter);
        worker.await.unwrap();

        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![
                SAVED_CHART_CREATED.to_string(),
                CONDITIONAL_FORMATTING_RULE_SAVED.to_string(),
                CONDITIONAL_FORMATTING_RULE_SAVED.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn sink_failures_stay_inside_the_worker() {
        let (emitter, worker) = ChannelEmitter::spawn(FailingSink, 4);
        emitter.emit(AuditEvent::new(SAVED_CHART_DELETED, Uuid::new_v4(), json!({})));
        drop(emitter);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (emitter, worker) = ChannelEmitter::spawn(FailingSink, 1);
        for _ in 0..100 {
            emitter.emit(AuditEvent::new(SAVED_CHART_VIEW, Uuid::new_v4(), json!({})));
        }
        drop(emitter);
        worker.await.unwrap();
    }

    #[test]
    fn recording_emitter_keeps_order() {
        let emitter = RecordingEmitter::new();
        let clone = emitter.clone();
        clone.emit(AuditEvent::new(SAVED_CHART_CREATED, Uuid::new_v4(), json!({"a": 1})));
        clone.emit(AuditEvent::new(DUPLICATED_CHART_CREATED, Uuid::new_v4(), json!({})));

        assert_eq!(emitter.names(), vec![SAVED_CHART_CREATED, DUPLICATED_CHART_CREATED]);
        assert_eq!(
            emitter.find(SAVED_CHART_CREATED).unwrap().properties,
            json!({"a": 1})
        );
    }
}
