use serde::{Deserialize, Serialize};
use std::fmt;

/// Task state definitions for asynchronous provisioning operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Initial state when the task record is created
    Queued,
    /// A worker has picked the task up and is processing it
    Processing,
    /// Task completed successfully
    Completed,
    /// Task failed; may become retryable via an explicit retry
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal state (no further transitions except retry)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an active state (a worker is processing the task)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Queued
    }
}

/// Tenant instance lifecycle states.
///
/// Status only moves forward; a tenant is never silently reset to an
/// earlier lifecycle state, and deprovisioning is a status rather than a
/// row removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Storage and module activation are being prepared
    Provisioning,
    /// Tenant is serving traffic
    Active,
    /// Tenant is temporarily disabled
    Suspended,
    /// Tenant has been decommissioned
    Inactive,
    /// Storage preparation failed; visible for diagnosis and retry
    ProvisioningFailed,
    /// Module deactivation is in flight
    Deprovisioning,
}

impl TenantStatus {
    /// Check if this is a terminal lifecycle state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Inactive)
    }

    /// Check whether a forward transition to `target` is allowed
    pub fn can_transition_to(&self, target: TenantStatus) -> bool {
        matches!(
            (self, target),
            (Self::Provisioning, Self::Active)
                | (Self::Provisioning, Self::ProvisioningFailed)
                | (Self::Provisioning, Self::Deprovisioning)
                | (Self::Active, Self::Suspended)
                | (Self::Active, Self::Deprovisioning)
                | (Self::Suspended, Self::Active)
                | (Self::Suspended, Self::Deprovisioning)
                | (Self::ProvisioningFailed, Self::Deprovisioning)
                | (Self::Deprovisioning, Self::Inactive)
        )
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisioning => write!(f, "provisioning"),
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
            Self::Inactive => write!(f, "inactive"),
            Self::ProvisioningFailed => write!(f, "provisioning_failed"),
            Self::Deprovisioning => write!(f, "deprovisioning"),
        }
    }
}

impl std::str::FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(Self::Provisioning),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "inactive" => Ok(Self::Inactive),
            "provisioning_failed" => Ok(Self::ProvisioningFailed),
            "deprovisioning" => Ok(Self::Deprovisioning),
            _ => Err(format!("Invalid tenant status: {s}")),
        }
    }
}

impl Default for TenantStatus {
    fn default() -> Self {
        Self::Provisioning
    }
}
