//! # Tracked Task
//!
//! One asynchronous operation (provision, deprovision, feature update)
//! with a bounded lifecycle and retry budget. Created by whichever
//! component initiates the operation, mutated by worker callbacks and the
//! explicit retry operation, never deleted.

use crate::constants::{DEFAULT_ESTIMATE_MINUTES, DEFAULT_TASK_MAX_RETRIES};
use crate::messaging::{TaskMessage, TaskType};
use crate::state_machine::TaskStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Externally visible correlation id
    pub task_id: Uuid,
    pub task_type: TaskType,
    /// Tenant instance the operation belongs to
    pub tenant_instance_id: Uuid,
    /// Parent task when this task is one leg of a module fan-out
    pub parent_task_id: Option<Uuid>,
    pub status: TaskStatus,
    /// Progress percentage, 0-100
    pub progress: u8,
    pub current_step: Option<String>,
    /// Ordered names of steps reported complete by the worker
    pub completed_steps: Vec<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    /// Set at most once, the first time the task enters `Processing`
    pub started_at: Option<DateTime<Utc>>,
    /// Set only on reaching a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Advisory completion hint only; nothing enforces it
    pub estimated_completion: DateTime<Utc>,
    /// Snapshot of the originating message, kept for explicit retry
    /// republish
    pub message: Option<TaskMessage>,
}

impl Task {
    pub fn new(task_type: TaskType, tenant_instance_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            task_type,
            tenant_instance_id,
            parent_task_id: None,
            status: TaskStatus::Queued,
            progress: 0,
            current_step: None,
            completed_steps: Vec::new(),
            error_message: None,
            retry_count: 0,
            max_retries: DEFAULT_TASK_MAX_RETRIES,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            estimated_completion: now + Duration::minutes(DEFAULT_ESTIMATE_MINUTES),
            message: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_parent(mut self, parent_task_id: Uuid) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    pub fn with_estimated_completion(mut self, estimate: DateTime<Utc>) -> Self {
        self.estimated_completion = estimate;
        self
    }

    pub fn with_message(mut self, message: TaskMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// True iff the task failed and its retry budget is not spent
    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.max_retries
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
