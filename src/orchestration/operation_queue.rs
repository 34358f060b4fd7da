//! # Async Operation Queue
//!
//! Wraps a single logical operation as exactly one tracked task plus
//! exactly one published message, for callers that want a handle to poll
//! one unit of work rather than the orchestrator's module fan-out.
//!
//! Every call creates the task record strictly before publishing, so a
//! worker callback referencing the task id can never race ahead of its own
//! tracking record.

use super::errors::OrchestrationError;
use super::task_tracker::{TaskRetry, TaskTracker};
use super::types::{ProvisionRequest, QueuedOperation};
use crate::constants::{
    DEPROVISION_ESTIMATE_MINUTES, FEATURE_UPDATE_ESTIMATE_MINUTES, PROVISION_ESTIMATE_MINUTES,
    QUEUED_DEPROVISION_MAX_RETRIES, QUEUED_FEATURE_UPDATE_MAX_RETRIES,
    QUEUED_PROVISION_MAX_RETRIES,
};
use crate::messaging::{payload_keys, MessageBus, ModuleTarget, TaskMessage, TaskType};
use crate::models::{Task, TenantInstance};
use crate::store::ResourceStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Queues externally-initiated single-tenant operations
pub struct AsyncOperationQueue<S, B>
where
    S: ResourceStore,
    B: MessageBus,
{
    store: Arc<S>,
    bus: Arc<B>,
    tracker: TaskTracker<S>,
}

impl<S, B> AsyncOperationQueue<S, B>
where
    S: ResourceStore,
    B: MessageBus,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self {
            tracker: TaskTracker::new(store.clone()),
            store,
            bus,
        }
    }

    pub fn tracker(&self) -> &TaskTracker<S> {
        &self.tracker
    }

    /// Queue a provisioning operation for an already-allocated instance
    #[instrument(skip(self, request))]
    pub async fn queue_provision(
        &self,
        tenant_instance_id: Uuid,
        request: &ProvisionRequest,
        actor_id: &str,
    ) -> Result<QueuedOperation, OrchestrationError> {
        let instance = self.load_instance(tenant_instance_id).await?;
        let estimate = Utc::now() + Duration::minutes(PROVISION_ESTIMATE_MINUTES);

        let overrides = serde_json::to_value(&request.feature_overrides)
            .map_err(crate::messaging::MessagingError::from)?;
        let payload = HashMap::from([
            (
                payload_keys::TENANT_CODE.to_string(),
                instance.tenant_code.clone().into(),
            ),
            (
                payload_keys::CUSTOMER_ID.to_string(),
                instance.customer_id.to_string().into(),
            ),
            (
                payload_keys::DEPLOYMENT_TYPE.to_string(),
                instance.deployment_type.to_string().into(),
            ),
            (
                payload_keys::PRODUCT_ID.to_string(),
                request.product_id.to_string().into(),
            ),
            (
                payload_keys::SUBSCRIPTION_PLAN_ID.to_string(),
                request.subscription_plan_id.to_string().into(),
            ),
            (payload_keys::FEATURE_OVERRIDES.to_string(), overrides),
        ]);

        self.enqueue(
            &instance,
            TaskType::Provision,
            payload,
            QUEUED_PROVISION_MAX_RETRIES,
            estimate,
            actor_id,
        )
        .await
    }

    /// Queue a deprovisioning operation
    #[instrument(skip(self))]
    pub async fn queue_deprovision(
        &self,
        tenant_instance_id: Uuid,
    ) -> Result<QueuedOperation, OrchestrationError> {
        let instance = self.load_instance(tenant_instance_id).await?;
        let estimate = Utc::now() + Duration::minutes(DEPROVISION_ESTIMATE_MINUTES);

        let payload = HashMap::from([
            (
                payload_keys::TENANT_CODE.to_string(),
                instance.tenant_code.clone().into(),
            ),
            (
                payload_keys::CUSTOMER_ID.to_string(),
                instance.customer_id.to_string().into(),
            ),
        ]);

        self.enqueue(
            &instance,
            TaskType::Deprovision,
            payload,
            QUEUED_DEPROVISION_MAX_RETRIES,
            estimate,
            crate::constants::system::ORCHESTRATOR_ACTOR,
        )
        .await
    }

    /// Queue a feature update carrying the full feature map
    #[instrument(skip(self, features))]
    pub async fn queue_feature_update(
        &self,
        tenant_instance_id: Uuid,
        features: HashMap<String, bool>,
    ) -> Result<QueuedOperation, OrchestrationError> {
        let instance = self.load_instance(tenant_instance_id).await?;
        let estimate = Utc::now() + Duration::minutes(FEATURE_UPDATE_ESTIMATE_MINUTES);

        let features_json =
            serde_json::to_value(&features).map_err(crate::messaging::MessagingError::from)?;
        let payload = HashMap::from([
            (
                payload_keys::TENANT_CODE.to_string(),
                instance.tenant_code.clone().into(),
            ),
            (payload_keys::FEATURES.to_string(), features_json),
        ]);

        self.enqueue(
            &instance,
            TaskType::Update,
            payload,
            QUEUED_FEATURE_UPDATE_MAX_RETRIES,
            estimate,
            crate::constants::system::ORCHESTRATOR_ACTOR,
        )
        .await
    }

    /// Raw passthrough to the message bus for operations that need no
    /// tracking.
    pub async fn publish(
        &self,
        subject: &str,
        message: serde_json::Value,
    ) -> Result<(), OrchestrationError> {
        self.bus.publish(subject, message).await?;
        Ok(())
    }

    /// Reset a failed task and republish its originating message
    pub async fn retry(&self, task_id: Uuid) -> Result<TaskRetry, OrchestrationError> {
        let retry = self.tracker.retry(task_id).await?;

        if let Some(ref message) = retry.message {
            self.bus.publish_provisioning_task(message).await?;
            info!(
                task_id = %task_id,
                attempt = message.attempt,
                "Retried task republished"
            );
        }

        Ok(retry)
    }

    /// One tracked task, then one published message, in that order
    async fn enqueue(
        &self,
        instance: &TenantInstance,
        task_type: TaskType,
        payload: HashMap<String, serde_json::Value>,
        max_retries: u32,
        estimated_completion: DateTime<Utc>,
        actor_id: &str,
    ) -> Result<QueuedOperation, OrchestrationError> {
        let task = Task::new(task_type, instance.id)
            .with_max_retries(max_retries)
            .with_estimated_completion(estimated_completion);

        let message = TaskMessage::new(task.task_id, instance.id, task_type, ModuleTarget::All)
            .with_max_retries(max_retries)
            .with_payload(payload);

        let task = self
            .tracker
            .create(task.with_message(message.clone()))
            .await?;
        self.bus.publish_provisioning_task(&message).await?;

        info!(
            task_id = %task.task_id,
            task_type = task_type.as_str(),
            tenant_instance_id = %instance.id,
            actor = actor_id,
            "Operation queued"
        );

        Ok(QueuedOperation::for_task(task.task_id, estimated_completion))
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
