//! # Tenant Instance
//!
//! One provisioned, isolated application deployment for a customer. The
//! (instance, database, schema) triple is a single ownership unit addressed
//! by tenant code, and the orchestrator is its sole writer through each
//! lifecycle state.

use crate::database::ConnectionDescriptor;
use crate::state_machine::{StateMachineError, TenantStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Where a tenant's data lives: a common database isolated by schema, or a
/// database of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentType {
    Shared,
    Dedicated,
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Dedicated => write!(f, "dedicated"),
        }
    }
}

impl std::str::FromStr for DeploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(Self::Shared),
            "dedicated" => Ok(Self::Dedicated),
            _ => Err(format!("Invalid deployment type: {s}")),
        }
    }
}

/// A provisioned tenant application instance.
///
/// `tenant_code` is globally unique and immutable once assigned; `code`, if
/// present, is unique within the owning customer. Instances are never
/// hard-deleted: deprovisioning is a status, not a row removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInstance {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Globally unique, system-generated identifier; also names the schema
    pub tenant_code: String,
    /// Optional user-chosen short identifier, unique per customer
    pub code: Option<String>,
    pub name: String,
    pub environment: String,
    /// Product code of the application this instance runs
    pub application_type: String,
    pub deployment_type: DeploymentType,
    pub status: TenantStatus,
    /// Schema-scoped connection descriptor, set once storage is prepared
    pub connection: Option<ConnectionDescriptor>,
    /// Public API base address for the tenant
    pub api_base_url: String,
    /// Serialized active-feature set
    pub active_features: HashMap<String, bool>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl TenantInstance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: Uuid,
        tenant_code: impl Into<String>,
        name: impl Into<String>,
        environment: impl Into<String>,
        application_type: impl Into<String>,
        deployment_type: DeploymentType,
        api_base_url: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let actor = created_by.into();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            tenant_code: tenant_code.into(),
            code: None,
            name: name.into(),
            environment: environment.into(),
            application_type: application_type.into(),
            deployment_type,
            status: TenantStatus::Provisioning,
            connection: None,
            api_base_url: api_base_url.into(),
            active_features: HashMap::new(),
            created_by: actor.clone(),
            created_at: now,
            updated_by: actor,
            updated_at: now,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_active_features(mut self, features: HashMap<String, bool>) -> Self {
        self.active_features = features;
        self
    }

    /// Move the instance to a later lifecycle state, rejecting anything the
    /// forward-only transition table disallows.
    pub fn transition_to(
        &mut self,
        status: TenantStatus,
        actor: &str,
    ) -> Result<(), StateMachineError> {
        if !self.status.can_transition_to(status) {
            return Err(StateMachineError::InvalidTransition {
                from: self.status.to_string(),
                event: status.to_string(),
            });
        }
        self.status = status;
        self.touch(actor);
        Ok(())
    }

    /// Record the prepared storage descriptor
    pub fn attach_connection(&mut self, connection: ConnectionDescriptor, actor: &str) {
        self.connection = Some(connection);
        self.touch(actor);
    }

    /// Overwrite the active-feature set
    pub fn replace_features(&mut self, features: HashMap<String, bool>, actor: &str) {
        self.active_features = features;
        self.touch(actor);
    }

    fn touch(&mut self, actor: &str) {
        self.updated_by = actor.to_string();
        self.updated_at = Utc::now();
    }
}
