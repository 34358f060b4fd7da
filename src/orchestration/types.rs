//! # Orchestration Request and Result Types

use crate::constants;
use crate::models::DeploymentType;
use crate::state_machine::{TaskStatus, TenantStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to provision a new tenant instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub subscription_plan_id: Uuid,
    pub deployment_type: DeploymentType,
    /// Optional user-chosen short identifier, unique per customer
    pub code: Option<String>,
    pub name: String,
    /// Custom feature overrides layered on top of the plan's features
    pub feature_overrides: HashMap<String, bool>,
    /// Actor recorded on the rows this request creates
    pub requested_by: String,
}

impl ProvisionRequest {
    pub fn new(
        customer_id: Uuid,
        product_id: Uuid,
        subscription_plan_id: Uuid,
        name: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            product_id,
            subscription_plan_id,
            deployment_type: DeploymentType::Shared,
            code: None,
            name: name.into(),
            feature_overrides: HashMap::new(),
            requested_by: constants::system::ORCHESTRATOR_ACTOR.to_string(),
        }
    }

    pub fn with_deployment_type(mut self, deployment_type: DeploymentType) -> Self {
        self.deployment_type = deployment_type;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_feature_overrides(mut self, overrides: HashMap<String, bool>) -> Self {
        self.feature_overrides = overrides;
        self
    }

    pub fn with_requested_by(mut self, actor: impl Into<String>) -> Self {
        self.requested_by = actor.into();
        self
    }
}

/// Result of a successful provisioning request: the work has been handed
/// off, not completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReceipt {
    pub tenant_instance_id: Uuid,
    pub tenant_code: String,
    pub status: TenantStatus,
    /// Parent tracking task; each module fan-out message has a child task
    /// of its own
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Handle returned by the async operation queue for polling one unit of
/// work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub task_id: Uuid,
    pub status: TaskStatus,
    /// Relative poll path; the request layer absolutizes it
    pub status_path: String,
    /// Relative live-update path
    pub events_path: String,
    /// Advisory hint only
    pub estimated_completion: DateTime<Utc>,
}

impl QueuedOperation {
    pub fn for_task(task_id: Uuid, estimated_completion: DateTime<Utc>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Queued,
            status_path: constants::task_status_path(task_id),
            events_path: constants::task_events_path(task_id),
            estimated_completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_request_builder_defaults() {
        let request = ProvisionRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Acme CRM",
        );

        assert_eq!(request.deployment_type, DeploymentType::Shared);
        assert!(request.code.is_none());
        assert!(request.feature_overrides.is_empty());
    }

    #[test]
    fn test_queued_operation_paths() {
        let task_id = Uuid::new_v4();
        let op = QueuedOperation::for_task(task_id, Utc::now());

        assert_eq!(op.status, TaskStatus::Queued);
        assert!(op.status_path.contains(&task_id.to_string()));
        assert!(op.events_path.ends_with("/events"));
    }
}
