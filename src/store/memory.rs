//! # In-Memory Resource Store
//!
//! DashMap-backed reference implementation of [`ResourceStore`], used by
//! the test suite and local demos. Tenant-instance writes go through a
//! single RwLock-guarded map so tenant-code uniqueness stays atomic with
//! the insert that claims it.

use super::{ResourceStore, StoreError};
use crate::models::{Customer, Product, SubscriptionPlan, Task, TenantInstance};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    customers: DashMap<Uuid, Customer>,
    products: DashMap<Uuid, Product>,
    plans: DashMap<Uuid, SubscriptionPlan>,
    tenant_instances: RwLock<HashMap<Uuid, TenantInstance>>,
    tasks: DashMap<Uuid, Task>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
    }

    pub fn insert_product(&self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_subscription_plan(&self, plan: SubscriptionPlan) {
        self.plans.insert(plan.id, plan);
    }

    pub fn tenant_instance_count(&self) -> usize {
        self.tenant_instances.read().len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Look up an instance by its globally unique tenant code
    pub fn find_by_tenant_code(&self, tenant_code: &str) -> Option<TenantInstance> {
        self.tenant_instances
            .read()
            .values()
            .find(|i| i.tenant_code == tenant_code)
            .cloned()
    }

    /// Tasks belonging to a fan-out parent
    pub fn child_tasks(&self, parent_task_id: Uuid) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|entry| entry.value().parent_task_id == Some(parent_task_id))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.customers.get(&id).map(|c| c.clone()))
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).map(|p| p.clone()))
    }

    async fn get_subscription_plan(
        &self,
        id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, StoreError> {
        Ok(self.plans.get(&id).map(|p| p.clone()))
    }

    async fn get_tenant_instance(&self, id: Uuid) -> Result<Option<TenantInstance>, StoreError> {
        Ok(self.tenant_instances.read().get(&id).cloned())
    }

    async fn find_tenant_instance_by_code(
        &self,
        customer_id: Uuid,
        code: &str,
    ) -> Result<Option<TenantInstance>, StoreError> {
        Ok(self
            .tenant_instances
            .read()
            .values()
            .find(|i| i.customer_id == customer_id && i.code.as_deref() == Some(code))
            .cloned())
    }

    async fn add_tenant_instance(&self, instance: TenantInstance) -> Result<(), StoreError> {
        let mut instances = self.tenant_instances.write();

        if instances
            .values()
            .any(|existing| existing.tenant_code == instance.tenant_code)
        {
            return Err(StoreError::conflict(
                "tenant_instance",
                format!("tenant code {} already exists", instance.tenant_code),
            ));
        }

        instances.insert(instance.id, instance);
        Ok(())
    }

    async fn update_tenant_instance(&self, instance: TenantInstance) -> Result<(), StoreError> {
        let mut instances = self.tenant_instances.write();

        if !instances.contains_key(&instance.id) {
            return Err(StoreError::not_found("tenant_instance", instance.id));
        }

        instances.insert(instance.id, instance);
        Ok(())
    }

    async fn create_task(&self, task: Task) -> Result<(), StoreError> {
        if self.tasks.contains_key(&task.task_id) {
            return Err(StoreError::conflict(
                "task",
                format!("task {} already exists", task.task_id),
            ));
        }

        self.tasks.insert(task.task_id, task);
        Ok(())
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get(&task_id).map(|t| t.clone()))
    }

    async fn update_task(&self, task: Task) -> Result<(), StoreError> {
        if !self.tasks.contains_key(&task.task_id) {
            return Err(StoreError::not_found("task", task.task_id));
        }

        self.tasks.insert(task.task_id, task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeploymentType;

    fn instance(code: &str) -> TenantInstance {
        TenantInstance::new(
            Uuid::new_v4(),
            code,
            "Acme CRM",
            "development",
            "crm",
            DeploymentType::Shared,
            "http://localhost:8080",
            "tester",
        )
    }

    #[tokio::test]
    async fn test_tenant_code_uniqueness_enforced() {
        let store = InMemoryResourceStore::new();

        store
            .add_tenant_instance(instance("acme-shared-1a2b3c4d"))
            .await
            .unwrap();

        let duplicate = store
            .add_tenant_instance(instance("acme-shared-1a2b3c4d"))
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict { .. })));
        assert_eq!(store.tenant_instance_count(), 1);
    }

    #[tokio::test]
    async fn test_find_by_customer_and_code() {
        let store = InMemoryResourceStore::new();
        let customer_id = Uuid::new_v4();

        let mut first = instance("acme-shared-1a2b3c4d");
        first.customer_id = customer_id;
        first.code = Some("crm-prod".to_string());
        store.add_tenant_instance(first.clone()).await.unwrap();

        let found = store
            .find_tenant_instance_by_code(customer_id, "crm-prod")
            .await
            .unwrap();
        assert_eq!(found.map(|i| i.id), Some(first.id));

        let missing = store
            .find_tenant_instance_by_code(customer_id, "other")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_update_missing_task_is_not_found() {
        let store = InMemoryResourceStore::new();
        let task = Task::new(crate::messaging::TaskType::Provision, Uuid::new_v4());

        let result = tokio_test::block_on(store.update_task(task));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
