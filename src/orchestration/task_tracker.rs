//! # Task Tracker
//!
//! Owner of the task state machine: creation, progress and step updates,
//! completion, failure, and retry eligibility. Workers report back through
//! this surface, keyed by task id; every update is validated against the
//! pure transition table before it is persisted, so a task can never
//! appear both completed and failed.

use super::errors::OrchestrationError;
use crate::messaging::TaskMessage;
use crate::models::Task;
use crate::state_machine::{next_task_status, TaskEvent, TaskStatus};
use crate::store::ResourceStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Outcome of an explicit retry: the reset task, plus the originating
/// message (attempt advanced) for the caller to republish. Retry never
/// republishes by itself.
#[derive(Debug, Clone)]
pub struct TaskRetry {
    pub task: Task,
    pub message: Option<TaskMessage>,
}

/// Tracks asynchronous operations against the resource store
#[derive(Debug)]
pub struct TaskTracker<S: ResourceStore> {
    store: Arc<S>,
}

impl<S: ResourceStore> TaskTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a new task record. The record must exist before any message
    /// referencing its id is published, so worker callbacks can never race
    /// ahead of their own tracking row.
    pub async fn create(&self, task: Task) -> Result<Task, OrchestrationError> {
        self.store.create_task(task.clone()).await?;

        debug!(
            task_id = %task.task_id,
            task_type = task.task_type.as_str(),
            tenant_instance_id = %task.tenant_instance_id,
            "Task created"
        );
        Ok(task)
    }

    /// Load a task, failing with not-found for unknown ids
    pub async fn get(&self, task_id: Uuid) -> Result<Task, OrchestrationError> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("task", task_id))
    }

    /// Apply a worker status callback.
    ///
    /// `started_at` is set the first time the task enters `Processing` and
    /// never reset by later reports; `completed_at` is set only on reaching
    /// a terminal state.
    #[instrument(skip(self, current_step, error_message))]
    pub async fn update_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        progress: u8,
        current_step: Option<String>,
        error_message: Option<String>,
    ) -> Result<Task, OrchestrationError> {
        let mut task = self.get(task_id).await?;

        let event = match status {
            TaskStatus::Queued => {
                // Tasks return to queued only through the explicit retry
                // operation
                return Err(OrchestrationError::StateTransition(
                    crate::state_machine::StateMachineError::InvalidTransition {
                        from: task.status.to_string(),
                        event: "queue".to_string(),
                    },
                ));
            }
            TaskStatus::Processing if task.status == TaskStatus::Queued => TaskEvent::Start,
            TaskStatus::Processing => TaskEvent::Progress,
            TaskStatus::Completed => TaskEvent::Complete,
            TaskStatus::Failed => {
                TaskEvent::fail_with_error(error_message.clone().unwrap_or_default())
            }
        };

        let next = next_task_status(task.status, &event)?;
        let now = Utc::now();

        task.status = next;
        task.progress = progress.min(100);
        if current_step.is_some() {
            task.current_step = current_step;
        }
        if error_message.is_some() {
            task.error_message = error_message;
        }
        if next == TaskStatus::Processing && task.started_at.is_none() {
            task.started_at = Some(now);
        }
        if next.is_terminal() && task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
        task.updated_at = now;

        self.store.update_task(task.clone()).await?;

        debug!(
            task_id = %task_id,
            status = %task.status,
            progress = task.progress,
            "Task status updated"
        );
        Ok(task)
    }

    /// Append a completed step name for fine-grained progress reporting
    pub async fn add_completed_step(
        &self,
        task_id: Uuid,
        step: &str,
    ) -> Result<Task, OrchestrationError> {
        let mut task = self.get(task_id).await?;

        task.completed_steps.push(step.to_string());
        task.updated_at = Utc::now();
        self.store.update_task(task.clone()).await?;

        Ok(task)
    }

    /// Mark the task completed with full progress
    pub async fn mark_completed(&self, task_id: Uuid) -> Result<Task, OrchestrationError> {
        self.update_status(task_id, TaskStatus::Completed, 100, None, None)
            .await
    }

    /// Mark the task failed with the worker's error message
    pub async fn mark_failed(
        &self,
        task_id: Uuid,
        error_message: &str,
    ) -> Result<Task, OrchestrationError> {
        self.update_status(
            task_id,
            TaskStatus::Failed,
            0,
            None,
            Some(error_message.to_string()),
        )
        .await
    }

    /// True iff the task failed and its retry budget is not exhausted
    pub async fn can_retry(&self, task_id: Uuid) -> Result<bool, OrchestrationError> {
        Ok(self.get(task_id).await?.can_retry())
    }

    /// Reset a failed task for another attempt.
    ///
    /// Resets bookkeeping only: status back to queued, progress zeroed,
    /// step/error/timing fields cleared, retry count incremented. The
    /// returned message is for the caller to republish.
    #[instrument(skip(self))]
    pub async fn retry(&self, task_id: Uuid) -> Result<TaskRetry, OrchestrationError> {
        let mut task = self.get(task_id).await?;

        if !task.can_retry() {
            return Err(OrchestrationError::NotRetryable(task_id));
        }

        task.status = next_task_status(task.status, &TaskEvent::Retry)?;
        task.progress = 0;
        task.current_step = None;
        task.error_message = None;
        task.started_at = None;
        task.completed_at = None;
        task.retry_count += 1;
        task.updated_at = Utc::now();

        let message = task.message.clone().map(TaskMessage::next_attempt);
        if let Some(ref m) = message {
            task.message = Some(m.clone());
        }

        self.store.update_task(task.clone()).await?;

        info!(
            task_id = %task_id,
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            "Task reset for retry"
        );
        Ok(TaskRetry { task, message })
    }
}
