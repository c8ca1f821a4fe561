//! Audit event model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A write-once record describing one state transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub event: String,
    pub user_id: Uuid,
    pub properties: serde_json::Value,
}

impl AuditEvent {
    pub fn new(event: &str, user_id: Uuid, properties: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            user_id,
            properties,
        }
    }
}
