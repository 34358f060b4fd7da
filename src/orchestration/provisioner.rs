//! # Provisioning Orchestrator
//!
//! The core engine: validates provisioning requests, allocates tenant
//! instances, prepares backing storage, and fans out module activation to
//! the worker pool.
//!
//! ## Ordering
//!
//! Each public operation runs synchronously to completion and returns once
//! the work has been handed off, not once it is done. The tenant-instance
//! row and its prepared storage are durably committed before any task
//! message referencing that tenant is published, so a worker can never
//! observe a tenant that does not yet exist in the store. Fan-out messages
//! are mutually independent and are published concurrently.

use super::errors::{OrchestrationError, ValidationErrorKind};
use super::task_tracker::TaskTracker;
use super::types::{ProvisionReceipt, ProvisionRequest};
use crate::config::ProvisioningConfig;
use crate::constants::{self, FANOUT_MESSAGE_MAX_RETRIES, TENANT_CODE_SUFFIX_LEN};
use crate::messaging::{payload_keys, MessageBus, ModuleTarget, TaskMessage, TaskType};
use crate::models::{
    Customer, DeploymentType, Product, SubscriptionPlan, Task, TenantInstance,
};
use crate::state_machine::TenantStatus;
use crate::store::ResourceStore;
use crate::validation;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Everything validation resolved for a provisioning request
struct ValidatedProvision {
    customer: Customer,
    product: Product,
    plan: SubscriptionPlan,
    modules: Vec<String>,
}

/// Orchestrates tenant provisioning, deprovisioning, and feature updates
pub struct ProvisioningOrchestrator<S, B, P>
where
    S: ResourceStore,
    B: MessageBus,
    P: crate::database::StorageProvisioner,
{
    store: Arc<S>,
    bus: Arc<B>,
    provisioner: Arc<P>,
    tracker: TaskTracker<S>,
    config: ProvisioningConfig,
}

impl<S, B, P> ProvisioningOrchestrator<S, B, P>
where
    S: ResourceStore,
    B: MessageBus,
    P: crate::database::StorageProvisioner,
{
    pub fn new(
        store: Arc<S>,
        bus: Arc<B>,
        provisioner: Arc<P>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            tracker: TaskTracker::new(store.clone()),
            store,
            bus,
            provisioner,
            config,
        }
    }

    pub fn tracker(&self) -> &TaskTracker<S> {
        &self.tracker
    }

    /// Provision a new tenant instance.
    ///
    /// Validation is side-effect free: any violation fails before anything
    /// is persisted or published. On success the instance row is committed
    /// with status `provisioning`, storage is prepared, and one task
    /// message per enabled module is handed to the worker pool under a
    /// parent tracking task.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, name = %request.name))]
    pub async fn provision_tenant(
        &self,
        request: ProvisionRequest,
    ) -> Result<ProvisionReceipt, OrchestrationError> {
        let validated = self.validate_provision(&request).await?;

        let tenant_code = generate_tenant_code(&validated.customer.code, request.deployment_type);
        let api_base_url = self.config.api_base_url(&tenant_code, &validated.product);

        let mut instance = TenantInstance::new(
            request.customer_id,
            tenant_code.clone(),
            request.name.clone(),
            self.config.environment.clone(),
            validated.product.code.clone(),
            request.deployment_type,
            api_base_url,
            request.requested_by.clone(),
        )
        .with_active_features(request.feature_overrides.clone());
        if let Some(ref code) = request.code {
            instance = instance.with_code(code.clone());
        }

        self.store.add_tenant_instance(instance.clone()).await?;
        info!(
            tenant_instance_id = %instance.id,
            tenant_code = %tenant_code,
            "Tenant instance allocated"
        );

        // Storage preparation. On failure the instance must not be left in
        // an ambiguous provisioning state: persist the failure status
        // before propagating.
        let database = self
            .config
            .database_for(request.deployment_type, &validated.customer.code);
        match self.provisioner.prepare(&database, &tenant_code).await {
            Ok(descriptor) => {
                instance.attach_connection(descriptor, &request.requested_by);
                self.store.update_tenant_instance(instance.clone()).await?;
            }
            Err(source) => {
                error!(
                    tenant_instance_id = %instance.id,
                    tenant_code = %tenant_code,
                    error = %source,
                    "Storage preparation failed"
                );
                instance
                    .transition_to(TenantStatus::ProvisioningFailed, &request.requested_by)?;
                self.store.update_tenant_instance(instance).await?;
                return Err(OrchestrationError::StorageProvisioning {
                    tenant_code,
                    source,
                });
            }
        }

        // Parent task for the whole operation, one child task per module.
        // Every tracking record is committed before the first publish.
        let parent = self
            .tracker
            .create(
                Task::new(TaskType::Provision, instance.id)
                    .with_max_retries(FANOUT_MESSAGE_MAX_RETRIES)
                    .with_estimated_completion(
                        Utc::now() + Duration::minutes(constants::PROVISION_ESTIMATE_MINUTES),
                    ),
            )
            .await?;

        let mut messages = Vec::with_capacity(validated.modules.len());
        for module_id in &validated.modules {
            let child = Task::new(TaskType::Provision, instance.id)
                .with_parent(parent.task_id)
                .with_max_retries(FANOUT_MESSAGE_MAX_RETRIES);

            let message = self.fanout_message(&child, &instance, &validated, module_id, &request);
            self.tracker
                .create(child.with_message(message.clone()))
                .await?;
            messages.push(message);
        }

        // Module messages carry no mutual ordering guarantee
        futures::future::try_join_all(
            messages
                .iter()
                .map(|m| self.bus.publish_provisioning_task(m)),
        )
        .await?;

        info!(
            tenant_instance_id = %instance.id,
            tenant_code = %tenant_code,
            module_count = validated.modules.len(),
            task_id = %parent.task_id,
            "Provisioning handed off to worker pool"
        );

        Ok(ProvisionReceipt {
            tenant_instance_id: instance.id,
            tenant_code,
            status: TenantStatus::Provisioning,
            task_id: parent.task_id,
            created_at: instance.created_at,
        })
    }

    /// Begin decommissioning a tenant instance
    #[instrument(skip(self))]
    pub async fn deprovision_tenant(
        &self,
        tenant_instance_id: Uuid,
    ) -> Result<ProvisionReceipt, OrchestrationError> {
        let mut instance = self.load_instance(tenant_instance_id).await?;

        instance.transition_to(
            TenantStatus::Deprovisioning,
            constants::system::ORCHESTRATOR_ACTOR,
        )?;
        self.store.update_tenant_instance(instance.clone()).await?;

        let task = self
            .tracker
            .create(
                Task::new(TaskType::Deprovision, instance.id).with_estimated_completion(
                    Utc::now() + Duration::minutes(constants::DEPROVISION_ESTIMATE_MINUTES),
                ),
            )
            .await?;

        let message = TaskMessage::new(
            task.task_id,
            instance.id,
            TaskType::Deprovision,
            ModuleTarget::All,
        )
        .with_payload_entry(payload_keys::TENANT_CODE, instance.tenant_code.clone())
        .with_payload_entry(
            payload_keys::CUSTOMER_ID,
            instance.customer_id.to_string(),
        );
        self.bus.publish_provisioning_task(&message).await?;

        info!(
            tenant_instance_id = %instance.id,
            tenant_code = %instance.tenant_code,
            "Deprovisioning handed off to worker pool"
        );

        Ok(ProvisionReceipt {
            tenant_instance_id: instance.id,
            tenant_code: instance.tenant_code,
            status: TenantStatus::Deprovisioning,
            task_id: task.task_id,
            created_at: instance.created_at,
        })
    }

    /// Overwrite a tenant's active-feature set and notify the worker pool
    #[instrument(skip(self, features))]
    pub async fn update_tenant_features(
        &self,
        tenant_instance_id: Uuid,
        features: HashMap<String, bool>,
    ) -> Result<ProvisionReceipt, OrchestrationError> {
        validation::validate_feature_map(&features)
            .map_err(|e| ValidationErrorKind::InvalidFeatureMap(e.to_string()))?;

        let mut instance = self.load_instance(tenant_instance_id).await?;
        instance.replace_features(features.clone(), constants::system::ORCHESTRATOR_ACTOR);
        self.store.update_tenant_instance(instance.clone()).await?;

        let task = self
            .tracker
            .create(
                Task::new(TaskType::Update, instance.id).with_estimated_completion(
                    Utc::now() + Duration::minutes(constants::FEATURE_UPDATE_ESTIMATE_MINUTES),
                ),
            )
            .await?;

        let features_json = serde_json::to_value(&features)
            .map_err(crate::messaging::MessagingError::from)?;
        let message = TaskMessage::new(
            task.task_id,
            instance.id,
            TaskType::Update,
            ModuleTarget::All,
        )
        .with_payload_entry(payload_keys::TENANT_CODE, instance.tenant_code.clone())
        .with_payload_entry(payload_keys::FEATURES, features_json);
        self.bus.publish_provisioning_task(&message).await?;

        info!(
            tenant_instance_id = %instance.id,
            feature_count = features.len(),
            "Feature update handed off to worker pool"
        );

        Ok(ProvisionReceipt {
            tenant_instance_id: instance.id,
            tenant_code: instance.tenant_code,
            status: instance.status,
            task_id: task.task_id,
            created_at: instance.created_at,
        })
    }

    /// Fail-fast validation gate. Loads and checks every referent without
    /// writing anything.
    async fn validate_provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ValidatedProvision, OrchestrationError> {
        let customer = self
            .store
            .get_customer(request.customer_id)
            .await?
            .ok_or(ValidationErrorKind::CustomerNotFound(request.customer_id))?;
        if !customer.active {
            return Err(ValidationErrorKind::CustomerInactive(customer.id).into());
        }

        let product = self
            .store
            .get_product(request.product_id)
            .await?
            .ok_or(ValidationErrorKind::ProductNotFound(request.product_id))?;
        if !product.active {
            return Err(ValidationErrorKind::ProductInactive(product.id).into());
        }

        let plan = self
            .store
            .get_subscription_plan(request.subscription_plan_id)
            .await?
            .ok_or(ValidationErrorKind::PlanNotFound(
                request.subscription_plan_id,
            ))?;
        if !plan.active {
            return Err(ValidationErrorKind::PlanInactive(plan.id).into());
        }
        if plan.product_id != product.id {
            return Err(ValidationErrorKind::PlanProductMismatch {
                plan_id: plan.id,
                product_id: product.id,
            }
            .into());
        }

        if let Some(ref code) = request.code {
            if validation::validate_code(code).is_err() {
                return Err(ValidationErrorKind::InvalidCode(code.clone()).into());
            }
            if self
                .store
                .find_tenant_instance_by_code(request.customer_id, code)
                .await?
                .is_some()
            {
                return Err(ValidationErrorKind::DuplicateCode(code.clone()).into());
            }
        }

        if validation::validate_name(&request.name).is_err() {
            return Err(ValidationErrorKind::BlankName.into());
        }

        validation::validate_feature_map(&request.feature_overrides)
            .map_err(|e| ValidationErrorKind::InvalidFeatureMap(e.to_string()))?;

        // The module set comes straight from the already-loaded plan, so an
        // empty set is caught here, before anything is persisted.
        let modules = plan.enabled_module_ids();
        if modules.is_empty() {
            warn!(plan_id = %plan.id, "Subscription plan has no enabled modules");
            return Err(ValidationErrorKind::EmptyModuleSet(plan.id).into());
        }

        debug!(
            customer = %customer.code,
            product = %product.code,
            module_count = modules.len(),
            "Provision request validated"
        );

        Ok(ValidatedProvision {
            customer,
            product,
            plan,
            modules,
        })
    }

    fn fanout_message(
        &self,
        task: &Task,
        instance: &TenantInstance,
        validated: &ValidatedProvision,
        module_id: &str,
        request: &ProvisionRequest,
    ) -> TaskMessage {
        let overrides = serde_json::to_value(&request.feature_overrides)
            .unwrap_or(serde_json::Value::Null);
        let (database, schema) = match instance.connection {
            Some(ref descriptor) => (descriptor.database.clone(), descriptor.schema.clone()),
            None => (String::new(), instance.tenant_code.clone()),
        };

        TaskMessage::new(
            task.task_id,
            instance.id,
            TaskType::Provision,
            ModuleTarget::Module(module_id.to_string()),
        )
        .with_max_retries(FANOUT_MESSAGE_MAX_RETRIES)
        .with_payload_entry(payload_keys::TENANT_CODE, instance.tenant_code.clone())
        .with_payload_entry(payload_keys::CUSTOMER_ID, instance.customer_id.to_string())
        .with_payload_entry(
            payload_keys::DEPLOYMENT_TYPE,
            instance.deployment_type.to_string(),
        )
        .with_payload_entry(payload_keys::PRODUCT_ID, validated.product.id.to_string())
        .with_payload_entry(
            payload_keys::SUBSCRIPTION_PLAN_ID,
            validated.plan.id.to_string(),
        )
        .with_payload_entry(payload_keys::FEATURE_OVERRIDES, overrides)
        .with_payload_entry(payload_keys::DATABASE, database)
        .with_payload_entry(payload_keys::SCHEMA, schema)
        .with_payload_entry(
            payload_keys::PARENT_TASK_ID,
            task.parent_task_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        )
    }

    async fn load_instance(
        &self,
        tenant_instance_id: Uuid,
    ) -> Result<TenantInstance, OrchestrationError> {
        self.store
            .get_tenant_instance(tenant_instance_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("tenant_instance", tenant_instance_id))
    }
}

/// Generate a globally unique tenant code:
/// `{customerCode}-{deploymentType}-{8 random hex chars}`.
pub fn generate_tenant_code(customer_code: &str, deployment_type: DeploymentType) -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!(
        "{customer_code}-{deployment_type}-{}",
        &entropy[..TENANT_CODE_SUFFIX_LEN]
    )
}
