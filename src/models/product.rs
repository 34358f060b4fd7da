use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product record, read from the catalog side of the resource store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Short identifier keying per-product configuration overrides
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
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
