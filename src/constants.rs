//! # System Constants
//!
//! Central definitions for retry budgets, completion estimates, queue
//! subjects, and caller-facing path templates used across the
//! provisioning core.

use uuid::Uuid;

/// System-level identity constants
pub mod system {
    /// Actor recorded on rows written by the orchestrator itself
    pub const ORCHESTRATOR_ACTOR: &str = "provisioning-orchestrator";

    /// Environment assumed when none is configured
    pub const DEFAULT_ENVIRONMENT: &str = "development";
}

/// Queue subject consumed by the provisioning worker pool
pub const PROVISIONING_QUEUE: &str = "tenant_provisioning";

/// Number of random hex characters appended to a tenant code
pub const TENANT_CODE_SUFFIX_LEN: usize = 8;

/// Default retry budget for tracked tasks when the caller does not override
pub const DEFAULT_TASK_MAX_RETRIES: u32 = 3;

/// Retry budget for per-module fan-out messages published by the orchestrator
pub const FANOUT_MESSAGE_MAX_RETRIES: u32 = 5;

/// Retry budget for queued single-operation provisions
pub const QUEUED_PROVISION_MAX_RETRIES: u32 = 3;

/// Retry budget for queued deprovisions
pub const QUEUED_DEPROVISION_MAX_RETRIES: u32 = 3;

/// Retry budget for queued feature updates
pub const QUEUED_FEATURE_UPDATE_MAX_RETRIES: u32 = 2;

/// Default advisory completion estimate for tracked tasks (minutes)
pub const DEFAULT_ESTIMATE_MINUTES: i64 = 5;

/// Advisory completion estimate for queued provisions (minutes)
pub const PROVISION_ESTIMATE_MINUTES: i64 = 5;

/// Advisory completion estimate for queued deprovisions (minutes)
pub const DEPROVISION_ESTIMATE_MINUTES: i64 = 3;

/// Advisory completion estimate for queued feature updates (minutes)
pub const FEATURE_UPDATE_ESTIMATE_MINUTES: i64 = 2;

/// Relative poll path for a task's status.
///
/// Returned as a relative path; absolutizing it into a full URL is the
/// responsibility of the request-handling layer.
pub fn task_status_path(task_id: Uuid) -> String {
    format!("/api/v1/tasks/{task_id}/status")
}

/// Relative live-update (server-sent events) path for a task
pub fn task_events_path(task_id: Uuid) -> String {
    format!("/api/v1/tasks/{task_id}/events")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_paths_are_relative() {
        let id = Uuid::new_v4();
        let status = task_status_path(id);
        let events = task_events_path(id);

        assert!(status.starts_with("/api/v1/tasks/"));
        assert!(status.ends_with("/status"));
        assert!(events.ends_with("/events"));
        assert!(status.contains(&id.to_string()));
    }
}
