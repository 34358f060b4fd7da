//! Integration tests for the async operation queue: one tracked task plus
//! one published message per operation, task record strictly first.

mod common;
mod mocks;

use common::{harness, provision_request, seed_catalog};
use std::collections::HashMap;
use std::sync::Arc;
use tenancy_core::messaging::{ModuleTarget, TaskType};
use tenancy_core::orchestration::{AsyncOperationQueue, OrchestrationError};
use tenancy_core::state_machine::TaskStatus;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Provision a tenant through the orchestrator, then hand back a queue
/// wired to the same store and a fresh recording bus.
async fn queue_harness() -> (
    common::Harness,
    AsyncOperationQueue<tenancy_core::store::InMemoryResourceStore, mocks::RecordingBus>,
    Arc<mocks::RecordingBus>,
    tenancy_core::orchestration::ProvisionReceipt,
    tenancy_core::orchestration::ProvisionRequest,
) {
    let h = harness();
    let (customer, product, plan) = seed_catalog(&h.store, &["reports"]);
    let request = provision_request(&customer, &product, &plan);
    let receipt = h
        .orchestrator
        .provision_tenant(request.clone())
        .await
        .unwrap();

    let bus = Arc::new(mocks::RecordingBus::with_store_probe(h.store.clone()));
    let queue = AsyncOperationQueue::new(h.store.clone(), bus.clone());

    (h, queue, bus, receipt, request)
}

#[tokio::test]
async fn test_queue_provision_creates_task_before_publishing() {
    let (h, queue, bus, receipt, request) = queue_harness().await;
    let tasks_before = h.store.task_count();

    let queued = queue
        .queue_provision(receipt.tenant_instance_id, &request, "operator-7")
        .await
        .unwrap();

    assert_eq!(queued.status, TaskStatus::Queued);
    assert_eq!(h.store.task_count(), tasks_before + 1);

    let messages = bus.published_tasks();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].task_id, queued.task_id);
    assert_eq!(messages[0].task_type, TaskType::Provision);
    assert_eq!(messages[0].module_id, ModuleTarget::All);
    assert_eq!(messages[0].max_retries, 3);

    // The tracking record existed when the publish happened
    assert_eq!(bus.task_records_seen_at_publish(), vec![true]);

    // Poll and live-update paths are relative, templated on the task id
    assert_eq!(
        queued.status_path,
        format!("/api/v1/tasks/{}/status", queued.task_id)
    );
    assert_eq!(
        queued.events_path,
        format!("/api/v1/tasks/{}/events", queued.task_id)
    );

    // Advisory estimate lands around five minutes out
    let delta = queued.estimated_completion - Utc::now();
    assert!(delta > Duration::minutes(4) && delta < Duration::minutes(6));
}

#[tokio::test]
async fn test_queue_deprovision_budget_and_estimate() {
    let (_h, queue, bus, receipt, _request) = queue_harness().await;

    let queued = queue
        .queue_deprovision(receipt.tenant_instance_id)
        .await
        .unwrap();

    let messages = bus.published_tasks();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].task_type, TaskType::Deprovision);
    assert_eq!(messages[0].max_retries, 3);

    let delta = queued.estimated_completion - Utc::now();
    assert!(delta > Duration::minutes(2) && delta < Duration::minutes(4));
}

#[tokio::test]
async fn test_queue_feature_update_budget_and_estimate() {
    let (_h, queue, bus, receipt, _request) = queue_harness().await;

    let features = HashMap::from([("reports".to_string(), true)]);
    let queued = queue
        .queue_feature_update(receipt.tenant_instance_id, features)
        .await
        .unwrap();

    let messages = bus.published_tasks();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].task_type, TaskType::Update);
    assert_eq!(messages[0].max_retries, 2);

    let delta = queued.estimated_completion - Utc::now();
    assert!(delta > Duration::minutes(1) && delta < Duration::minutes(3));
}

#[tokio::test]
async fn test_queue_operations_on_unknown_instance_are_not_found() {
    let (_h, queue, _bus, _receipt, request) = queue_harness().await;

    let missing = Uuid::new_v4();
    let result = queue.queue_provision(missing, &request, "operator-7").await;
    assert!(matches!(
        result,
        Err(OrchestrationError::NotFound { entity, .. }) if entity == "tenant_instance"
    ));

    let result = queue.queue_deprovision(missing).await;
    assert!(matches!(result, Err(OrchestrationError::NotFound { .. })));
}

#[tokio::test]
async fn test_raw_publish_is_untracked_passthrough() {
    let (h, queue, bus, _receipt, _request) = queue_harness().await;
    let tasks_before = h.store.task_count();

    queue
        .publish("maintenance_events", serde_json::json!({"op": "vacuum"}))
        .await
        .unwrap();

    assert_eq!(h.store.task_count(), tasks_before);
    assert_eq!(bus.raw_messages().len(), 1);
    assert_eq!(bus.raw_messages()[0].0, "maintenance_events");
    assert!(bus.published_tasks().is_empty());
}

#[tokio::test]
async fn test_queue_retry_republishes_with_bumped_attempt() {
    let (_h, queue, bus, receipt, request) = queue_harness().await;

    let queued = queue
        .queue_provision(receipt.tenant_instance_id, &request, "operator-7")
        .await
        .unwrap();
    queue
        .tracker()
        .mark_failed(queued.task_id, "module activation failed")
        .await
        .unwrap();

    let retry = queue.retry(queued.task_id).await.unwrap();

    assert_eq!(retry.task.status, TaskStatus::Queued);
    assert_eq!(retry.task.retry_count, 1);

    let messages = bus.published_tasks();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].task_id, queued.task_id);
    assert_eq!(messages[1].attempt, 2);
}
