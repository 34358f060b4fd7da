use serde::{Deserialize, Serialize};

/// Events that can trigger task state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    /// A worker started (or re-reported starting) the task
    Start,
    /// A worker reported incremental progress
    Progress,
    /// Mark the task as completed
    Complete,
    /// Mark the task as failed with an error message
    Fail(String),
    /// Explicitly reset a failed task for another attempt
    Retry,
}

impl TaskEvent {
    /// String representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Retry => "retry",
        }
    }

    /// Extract the error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Fail(_))
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
