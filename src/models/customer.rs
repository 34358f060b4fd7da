use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer record, read from the catalog side of the resource store.
/// The orchestrator only consults it: provisioning requires an active
/// customer, and the customer code seeds tenant-code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    /// Short identifier used as the tenant-code prefix
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(id: Uuid, code: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            code: code.into(),
            name: name.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
