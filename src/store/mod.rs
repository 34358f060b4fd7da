//! # Resource Store Contract
//!
//! Durable storage seam for tenant instances, catalog records, and tasks.
//! All operations are synchronous-commit: a caller observing a successful
//! return may assume durability, which is what lets the orchestrator
//! guarantee that a worker never sees a message for a tenant that does not
//! yet exist in the store.

pub mod memory;

use crate::models::{Customer, Product, SubscriptionPlan, Task, TenantInstance};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryResourceStore;

/// Errors surfaced by resource store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} conflict: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, detail: impl ToString) -> Self {
        Self::Conflict {
            entity,
            detail: detail.to_string(),
        }
    }
}

/// Get/add/update/save operations the orchestration core requires from
/// durable storage.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn get_subscription_plan(&self, id: Uuid)
        -> Result<Option<SubscriptionPlan>, StoreError>;

    async fn get_tenant_instance(&self, id: Uuid) -> Result<Option<TenantInstance>, StoreError>;

    /// Look up a tenant instance by its owning customer and user-chosen
    /// code, used to enforce per-customer code uniqueness.
    async fn find_tenant_instance_by_code(
        &self,
        customer_id: Uuid,
        code: &str,
    ) -> Result<Option<TenantInstance>, StoreError>;

    /// Persist a new tenant instance. Fails with a conflict if the tenant
    /// code is already taken.
    async fn add_tenant_instance(&self, instance: TenantInstance) -> Result<(), StoreError>;

    async fn update_tenant_instance(&self, instance: TenantInstance) -> Result<(), StoreError>;

    async fn create_task(&self, task: Task) -> Result<(), StoreError>;

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn update_task(&self, task: Task) -> Result<(), StoreError>;
}
