//! Scheduled delivery domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerFormat {
    Csv,
    Image,
}

impl SchedulerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerFormat::Csv => "csv",
            SchedulerFormat::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(SchedulerFormat::Csv),
            "image" => Some(SchedulerFormat::Image),
            _ => None,
        }
    }
}

/// The resource a scheduler delivers. Exactly one of chart or dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SchedulerOwner {
    Chart(Uuid),
    Dashboard(Uuid),
}

impl SchedulerOwner {
    pub fn resource_type(&self) -> &'static str {
        match self {
            SchedulerOwner::Chart(_) => "chart",
            SchedulerOwner::Dashboard(_) => "dashboard",
        }
    }

    pub fn resource_id(&self) -> Uuid {
        match self {
            SchedulerOwner::Chart(id) | SchedulerOwner::Dashboard(id) => *id,
        }
    }
}

/// A delivery destination owned by its scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerTarget {
    Slack { id: Uuid, channel: String },
    Email { id: Uuid, recipient: String },
}

impl SchedulerTarget {
    pub fn id(&self) -> Uuid {
        match self {
            SchedulerTarget::Slack { id, .. } | SchedulerTarget::Email { id, .. } => *id,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SchedulerTarget::Slack { .. } => "slack",
            SchedulerTarget::Email { .. } => "email",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scheduler {
    pub id: Uuid,
    pub name: String,
    pub message: Option<String>,
    pub cron: String,
    pub format: SchedulerFormat,
    pub owner: SchedulerOwner,
    pub created_by: Uuid,
    pub targets: Vec<SchedulerTarget>,
    pub created_at: DateTime<Utc>,
}

impl Scheduler {
    /// Messaging channels this scheduler delivers to, deduplicated.
    pub fn slack_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .targets
            .iter()
            .filter_map(|t| match t {
                SchedulerTarget::Slack { channel, .. } => Some(channel.clone()),
                SchedulerTarget::Email { .. } => None,
            })
            .collect();
        channels.sort();
        channels.dedup();
        channels
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreateSchedulerTarget {
    Slack { channel: String },
    Email { recipient: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduler {
    pub name: String,
    pub message: Option<String>,
    pub cron: String,
    pub format: SchedulerFormat,
    pub targets: Vec<CreateSchedulerTarget>,
}
