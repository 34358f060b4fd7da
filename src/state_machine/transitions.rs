//! # Task Transition Rules
//!
//! Pure transition table for the task state machine. Keeping the table
//! free of storage concerns lets the tracker validate every callback
//! against it before anything is persisted, so a task can never appear
//! both completed and failed.

use super::events::TaskEvent;
use super::states::TaskStatus;
use thiserror::Error;

/// Errors raised by transition evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

/// Determine the target status for an event applied to the current status.
///
/// Status moves forward only: skipping `Processing` is allowed under
/// at-least-once delivery, returning to `Queued` is allowed solely via the
/// explicit `Retry` event on a failed task.
pub fn next_task_status(
    current: TaskStatus,
    event: &TaskEvent,
) -> Result<TaskStatus, StateMachineError> {
    let target = match (current, event) {
        (TaskStatus::Queued, TaskEvent::Start) => TaskStatus::Processing,
        (TaskStatus::Queued, TaskEvent::Complete) => TaskStatus::Completed,
        (TaskStatus::Queued, TaskEvent::Fail(_)) => TaskStatus::Failed,

        // Redelivered start/progress reports are idempotent
        (TaskStatus::Processing, TaskEvent::Start) => TaskStatus::Processing,
        (TaskStatus::Processing, TaskEvent::Progress) => TaskStatus::Processing,
        (TaskStatus::Processing, TaskEvent::Complete) => TaskStatus::Completed,
        (TaskStatus::Processing, TaskEvent::Fail(_)) => TaskStatus::Failed,

        (TaskStatus::Failed, TaskEvent::Retry) => TaskStatus::Queued,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_happy_path_transitions() {
        assert_eq!(
            next_task_status(TaskStatus::Queued, &TaskEvent::Start).unwrap(),
            TaskStatus::Processing
        );
        assert_eq!(
            next_task_status(TaskStatus::Processing, &TaskEvent::Complete).unwrap(),
            TaskStatus::Completed
        );
        assert_eq!(
            next_task_status(TaskStatus::Processing, &TaskEvent::fail_with_error("boom")).unwrap(),
            TaskStatus::Failed
        );
    }

    #[test]
    fn test_forward_skip_from_queued() {
        assert_eq!(
            next_task_status(TaskStatus::Queued, &TaskEvent::Complete).unwrap(),
            TaskStatus::Completed
        );
        assert_eq!(
            next_task_status(TaskStatus::Queued, &TaskEvent::fail_with_error("boom")).unwrap(),
            TaskStatus::Failed
        );
    }

    #[test]
    fn test_redelivered_start_is_idempotent() {
        assert_eq!(
            next_task_status(TaskStatus::Processing, &TaskEvent::Start).unwrap(),
            TaskStatus::Processing
        );
    }

    #[test]
    fn test_retry_only_from_failed() {
        assert_eq!(
            next_task_status(TaskStatus::Failed, &TaskEvent::Retry).unwrap(),
            TaskStatus::Queued
        );
        assert!(next_task_status(TaskStatus::Queued, &TaskEvent::Retry).is_err());
        assert!(next_task_status(TaskStatus::Processing, &TaskEvent::Retry).is_err());
        assert!(next_task_status(TaskStatus::Completed, &TaskEvent::Retry).is_err());
    }

    #[test]
    fn test_completed_is_sealed() {
        for event in [
            TaskEvent::Start,
            TaskEvent::Progress,
            TaskEvent::Complete,
            TaskEvent::fail_with_error("late failure"),
            TaskEvent::Retry,
        ] {
            assert!(next_task_status(TaskStatus::Completed, &event).is_err());
        }
    }

    fn any_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Queued),
            Just(TaskStatus::Processing),
            Just(TaskStatus::Completed),
            Just(TaskStatus::Failed),
        ]
    }

    fn any_event() -> impl Strategy<Value = TaskEvent> {
        prop_oneof![
            Just(TaskEvent::Start),
            Just(TaskEvent::Progress),
            Just(TaskEvent::Complete),
            ".*".prop_map(TaskEvent::Fail),
            Just(TaskEvent::Retry),
        ]
    }

    proptest! {
        // The only way back into Queued is the explicit retry of a failure,
        // and nothing leaves Completed.
        #[test]
        fn prop_monotone_except_retry(current in any_status(), event in any_event()) {
            if let Ok(next) = next_task_status(current, &event) {
                if next == TaskStatus::Queued {
                    prop_assert_eq!(current, TaskStatus::Failed);
                    prop_assert_eq!(event.event_type(), "retry");
                }
                prop_assert_ne!(current, TaskStatus::Completed);
            }
        }
    }
}
