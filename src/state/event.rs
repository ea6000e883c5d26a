//! User-facing messages published by the controller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Deleted,
    Completed,
    Cycled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Deleted => "deleted",
            EventKind::Completed => "completed",
            EventKind::Cycled => "cycled",
        }
    }
}

/// A toast-style message about a timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub kind: EventKind,
    pub timer_id: Uuid,
    pub label: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl TimerEvent {
    pub fn new(kind: EventKind, timer: &Timer) -> Self {
        let (title, message) = match kind {
            EventKind::Created => (
                "Timer created",
                format!("\"{}\" timer has been created.", timer.label),
            ),
            EventKind::Deleted => (
                "Timer deleted",
                format!("\"{}\" timer has been deleted.", timer.label),
            ),
            EventKind::Completed => (
                "Timer completed",
                format!("\"{}\" timer has finished.", timer.label),
            ),
            EventKind::Cycled => (
                "Cycle completed",
                format!("\"{}\" timer completed a cycle and restarted.", timer.label),
            ),
        };

        Self {
            kind,
            timer_id: timer.id,
            label: timer.label.clone(),
            title: title.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}
