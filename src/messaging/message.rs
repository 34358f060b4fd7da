//! # Task Message Structures
//!
//! Wire payloads handed to the message bus for the provisioning worker
//! pool. One provisioning operation fans out into one message per enabled
//! module; single-operation paths emit exactly one message targeting all
//! modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of asynchronous operation a message describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Activate modules for a newly allocated tenant
    Provision,
    /// Deactivate a tenant's modules
    Deprovision,
    /// Apply an updated feature set to a tenant
    Update,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Deprovision => "deprovision",
            Self::Update => "update",
        }
    }
}

/// Which module a message addresses: one specific module, or all of them
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleTarget {
    All,
    Module(String),
}

impl ModuleTarget {
    /// Wire representation of the "all modules" target
    pub const ALL: &'static str = "all";

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Module(id) => id,
        }
    }
}

impl From<String> for ModuleTarget {
    fn from(value: String) -> Self {
        if value == Self::ALL {
            Self::All
        } else {
            Self::Module(value)
        }
    }
}

impl From<ModuleTarget> for String {
    fn from(value: ModuleTarget) -> Self {
        value.as_str().to_string()
    }
}

/// Well-known payload keys.
///
/// The payload never carries credentials; workers resolve connection
/// secrets through their own configuration.
pub mod payload_keys {
    pub const TENANT_CODE: &str = "tenant_code";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const DEPLOYMENT_TYPE: &str = "deployment_type";
    pub const PRODUCT_ID: &str = "product_id";
    pub const SUBSCRIPTION_PLAN_ID: &str = "subscription_plan_id";
    pub const FEATURE_OVERRIDES: &str = "feature_overrides";
    pub const FEATURES: &str = "features";
    pub const DATABASE: &str = "database";
    pub const SCHEMA: &str = "schema";
    pub const PARENT_TASK_ID: &str = "parent_task_id";
}

/// Message handed to the worker pool describing one unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Correlation id; equals the tracked task's id
    pub task_id: Uuid,
    /// Tenant instance the work belongs to
    pub tenant_id: Uuid,
    pub task_type: TaskType,
    pub module_id: ModuleTarget,
    /// String-keyed operation payload (see [`payload_keys`])
    pub payload: HashMap<String, serde_json::Value>,
    /// Delivery attempt, starting at 1
    pub attempt: u32,
    pub max_retries: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TaskMessage {
    pub fn new(task_id: Uuid, tenant_id: Uuid, task_type: TaskType, module_id: ModuleTarget) -> Self {
        Self {
            task_id,
            tenant_id,
            task_type,
            module_id,
            payload: HashMap::new(),
            attempt: 1,
            max_retries: crate::constants::DEFAULT_TASK_MAX_RETRIES,
            created_at: chrono::Utc::now(),
        }
    }

    /// Replace the payload map
    pub fn with_payload(mut self, payload: HashMap<String, serde_json::Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Insert a single payload entry
    pub fn with_payload_entry(
        mut self,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Copy of this message with the attempt counter advanced, used when a
    /// retried task is republished.
    pub fn next_attempt(mut self) -> Self {
        self.attempt += 1;
        self.created_at = chrono::Utc::now();
        self
    }

    /// Check if the retry budget has been spent
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt > self.max_retries
    }

    /// Convert to JSON for queue transport
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a message received from the queue
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_target_wire_format() {
        let all = serde_json::to_string(&ModuleTarget::All).unwrap();
        assert_eq!(all, "\"all\"");

        let module = serde_json::to_string(&ModuleTarget::Module("reports".to_string())).unwrap();
        assert_eq!(module, "\"reports\"");

        let parsed: ModuleTarget = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, ModuleTarget::All);

        let parsed: ModuleTarget = serde_json::from_str("\"billing\"").unwrap();
        assert_eq!(parsed, ModuleTarget::Module("billing".to_string()));
    }

    #[test]
    fn test_message_json_round_trip() {
        let message = TaskMessage::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TaskType::Provision,
            ModuleTarget::Module("reports".to_string()),
        )
        .with_payload_entry(payload_keys::TENANT_CODE, "acme-shared-1a2b3c4d")
        .with_max_retries(5);

        let json = message.to_json().unwrap();
        let parsed = TaskMessage::from_json(json).unwrap();

        assert_eq!(parsed, message);
        assert_eq!(
            parsed.payload[payload_keys::TENANT_CODE],
            serde_json::json!("acme-shared-1a2b3c4d")
        );
    }

    #[test]
    fn test_attempt_bookkeeping() {
        let message = TaskMessage::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TaskType::Deprovision,
            ModuleTarget::All,
        )
        .with_max_retries(2);

        assert_eq!(message.attempt, 1);
        assert!(!message.attempts_exhausted());

        let third = message.next_attempt().next_attempt();
        assert_eq!(third.attempt, 3);
        assert!(third.attempts_exhausted());
    }

    #[test]
    fn test_task_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskType::Provision).unwrap(),
            "\"provision\""
        );
        assert_eq!(TaskType::Update.as_str(), "update");
    }
}
