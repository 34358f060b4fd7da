//! # Orchestration Error Types
//!
//! Validation failures carry a kind enum so callers branch on the cause
//! rather than message text; not-found is distinguished from validation so
//! the request layer can map it to a distinct response.

use crate::database::ProvisionerError;
use crate::messaging::MessagingError;
use crate::state_machine::StateMachineError;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Specific cause of a rejected provisioning request.
///
/// Every kind is detected before any write: nothing is persisted or
/// published for a request that fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error("customer is not active: {0}")]
    CustomerInactive(Uuid),

    #[error("product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("product is not active: {0}")]
    ProductInactive(Uuid),

    #[error("subscription plan not found: {0}")]
    PlanNotFound(Uuid),

    #[error("subscription plan is not active: {0}")]
    PlanInactive(Uuid),

    #[error("subscription plan {plan_id} does not belong to product {product_id}")]
    PlanProductMismatch { plan_id: Uuid, product_id: Uuid },

    #[error("code {0:?} contains invalid characters")]
    InvalidCode(String),

    #[error("code {0:?} is already in use for this customer")]
    DuplicateCode(String),

    #[error("name must not be blank")]
    BlankName,

    #[error("invalid feature map: {0}")]
    InvalidFeatureMap(String),

    #[error("subscription plan {0} has no enabled modules")]
    EmptyModuleSet(Uuid),
}

/// Errors surfaced by the provisioning orchestrator, operation queue, and
/// task tracker.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrorKind),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("storage provisioning failed for tenant {tenant_code}: {source}")]
    StorageProvisioning {
        tenant_code: String,
        #[source]
        source: ProvisionerError,
    },

    #[error("task {0} is not retryable")]
    NotRetryable(Uuid),

    #[error("resource store error: {0}")]
    Store(StoreError),

    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("state transition error: {0}")]
    StateTransition(#[from] StateMachineError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl OrchestrationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The validation kind, if this is a validation failure
    pub fn validation_kind(&self) -> Option<&ValidationErrorKind> {
        match self {
            Self::Validation(kind) => Some(kind),
            _ => None,
        }
    }
}

impl From<StoreError> for OrchestrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Store(other),
        }
    }
}
