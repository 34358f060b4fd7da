//! Integration tests for the task tracker state machine: status updates,
//! step reporting, terminal-state discipline, and bounded retry.

mod common;
mod mocks;

use std::sync::Arc;
use tenancy_core::messaging::{ModuleTarget, TaskMessage, TaskType};
use tenancy_core::models::Task;
use tenancy_core::orchestration::{OrchestrationError, TaskTracker};
use tenancy_core::state_machine::TaskStatus;
use tenancy_core::store::InMemoryResourceStore;
use uuid::Uuid;

fn tracker() -> (Arc<InMemoryResourceStore>, TaskTracker<InMemoryResourceStore>) {
    let store = Arc::new(InMemoryResourceStore::new());
    let tracker = TaskTracker::new(store.clone());
    (store, tracker)
}

async fn queued_task(tracker: &TaskTracker<InMemoryResourceStore>) -> Task {
    tracker
        .create(Task::new(TaskType::Provision, Uuid::new_v4()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_persists_queued_task_with_defaults() {
    let (store, tracker) = tracker();

    let task = queued_task(&tracker).await;

    assert_eq!(task.status, TaskStatus::Queued);
    assert_eq!(task.progress, 0);
    assert_eq!(task.retry_count, 0);
    assert_eq!(task.max_retries, 3);
    assert_eq!(store.task_count(), 1);
}

#[tokio::test]
async fn test_started_at_is_set_once() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    let first = tracker
        .update_status(
            task.task_id,
            TaskStatus::Processing,
            10,
            Some("prepare_schema".to_string()),
            None,
        )
        .await
        .unwrap();
    let started_at = first.started_at.expect("started_at set on first Processing");
    assert_eq!(first.current_step.as_deref(), Some("prepare_schema"));

    // A later Processing update must not reset the start time
    let second = tracker
        .update_status(
            task.task_id,
            TaskStatus::Processing,
            60,
            Some("activate_modules".to_string()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(second.started_at, Some(started_at));
    assert_eq!(second.progress, 60);
    assert_eq!(second.current_step.as_deref(), Some("activate_modules"));
}

#[tokio::test]
async fn test_mark_completed_sets_terminal_fields() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    tracker
        .update_status(task.task_id, TaskStatus::Processing, 50, None, None)
        .await
        .unwrap();
    let completed = tracker.mark_completed(task.task_id).await.unwrap();

    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.progress, 100);
    assert!(completed.completed_at.is_some());
}

#[tokio::test]
async fn test_completed_task_cannot_become_failed() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    tracker.mark_completed(task.task_id).await.unwrap();

    let result = tracker.mark_failed(task.task_id, "late worker report").await;
    assert!(matches!(
        result,
        Err(OrchestrationError::StateTransition(_))
    ));

    // The visible terminal state is unchanged
    let current = tracker.get(task.task_id).await.unwrap();
    assert_eq!(current.status, TaskStatus::Completed);
    assert!(current.error_message.is_none());
}

#[tokio::test]
async fn test_mark_failed_records_error() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    let failed = tracker
        .mark_failed(task.task_id, "schema creation timed out")
        .await
        .unwrap();

    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.progress, 0);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("schema creation timed out")
    );
    assert!(failed.completed_at.is_some());
}

#[tokio::test]
async fn test_add_completed_step_preserves_order() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    tracker
        .add_completed_step(task.task_id, "create_database")
        .await
        .unwrap();
    tracker
        .add_completed_step(task.task_id, "create_schema")
        .await
        .unwrap();
    let updated = tracker
        .add_completed_step(task.task_id, "activate_module")
        .await
        .unwrap();

    assert_eq!(
        updated.completed_steps,
        vec!["create_database", "create_schema", "activate_module"]
    );
}

#[tokio::test]
async fn test_can_retry_only_when_failed_with_budget() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    assert!(!tracker.can_retry(task.task_id).await.unwrap());

    tracker.mark_failed(task.task_id, "boom").await.unwrap();
    assert!(tracker.can_retry(task.task_id).await.unwrap());
}

#[tokio::test]
async fn test_retry_resets_bookkeeping_only() {
    let (_store, tracker) = tracker();
    let message = TaskMessage::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        TaskType::Provision,
        ModuleTarget::All,
    );
    let task = tracker
        .create(
            Task::new(TaskType::Provision, Uuid::new_v4()).with_message(message.clone()),
        )
        .await
        .unwrap();

    tracker
        .update_status(task.task_id, TaskStatus::Processing, 40, Some("step".into()), None)
        .await
        .unwrap();
    tracker.mark_failed(task.task_id, "boom").await.unwrap();

    let retry = tracker.retry(task.task_id).await.unwrap();

    assert_eq!(retry.task.status, TaskStatus::Queued);
    assert_eq!(retry.task.progress, 0);
    assert_eq!(retry.task.retry_count, 1);
    assert!(retry.task.current_step.is_none());
    assert!(retry.task.error_message.is_none());
    assert!(retry.task.started_at.is_none());
    assert!(retry.task.completed_at.is_none());

    // Retry hands the message back for republish instead of publishing
    let replay = retry.message.expect("snapshot returned for republish");
    assert_eq!(replay.task_id, message.task_id);
    assert_eq!(replay.attempt, 2);
}

#[tokio::test]
async fn test_retry_budget_exhaustion_is_permanent() {
    let (_store, tracker) = tracker();
    let task = tracker
        .create(Task::new(TaskType::Provision, Uuid::new_v4()).with_max_retries(2))
        .await
        .unwrap();

    for _ in 0..2 {
        tracker.mark_failed(task.task_id, "boom").await.unwrap();
        tracker.retry(task.task_id).await.unwrap();
    }

    tracker.mark_failed(task.task_id, "boom").await.unwrap();
    assert!(!tracker.can_retry(task.task_id).await.unwrap());
    assert!(matches!(
        tracker.retry(task.task_id).await,
        Err(OrchestrationError::NotRetryable(_))
    ));

    // Still exhausted no matter how often it is asked
    assert!(!tracker.can_retry(task.task_id).await.unwrap());
}

#[tokio::test]
async fn test_retry_requires_failed_status() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    assert!(matches!(
        tracker.retry(task.task_id).await,
        Err(OrchestrationError::NotRetryable(_))
    ));
}

#[tokio::test]
async fn test_unknown_task_id_is_not_found() {
    let (_store, tracker) = tracker();
    let missing = Uuid::new_v4();

    assert!(matches!(
        tracker.get(missing).await,
        Err(OrchestrationError::NotFound { entity, .. }) if entity == "task"
    ));
    assert!(matches!(
        tracker.mark_completed(missing).await,
        Err(OrchestrationError::NotFound { .. })
    ));
    assert!(matches!(
        tracker.add_completed_step(missing, "step").await,
        Err(OrchestrationError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_progress_is_clamped_to_hundred() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    let updated = tracker
        .update_status(task.task_id, TaskStatus::Processing, 250, None, None)
        .await
        .unwrap();

    assert_eq!(updated.progress, 100);
}

#[tokio::test]
async fn test_direct_requeue_is_rejected() {
    let (_store, tracker) = tracker();
    let task = queued_task(&tracker).await;

    tracker
        .update_status(task.task_id, TaskStatus::Processing, 10, None, None)
        .await
        .unwrap();

    let result = tracker
        .update_status(task.task_id, TaskStatus::Queued, 0, None, None)
        .await;
    assert!(matches!(
        result,
        Err(OrchestrationError::StateTransition(_))
    ));
}
