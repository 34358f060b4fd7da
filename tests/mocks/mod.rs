//! Test doubles for the orchestration seams: a recording message bus and a
//! scriptable storage provisioner.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tenancy_core::database::{ConnectionDescriptor, ProvisionerError, StorageProvisioner};
use tenancy_core::messaging::{MessageBus, MessagingError, TaskMessage};
use tenancy_core::store::{InMemoryResourceStore, ResourceStore};

/// Message bus that records everything published instead of delivering it.
///
/// When built with a store probe, each provisioning publish also records
/// whether the message's task record already existed in the store at
/// publish time, which is how the task-before-publish contract is
/// asserted.
#[derive(Default)]
pub struct RecordingBus {
    raw: Mutex<Vec<(String, serde_json::Value)>>,
    tasks: Mutex<Vec<TaskMessage>>,
    task_seen_at_publish: Mutex<Vec<bool>>,
    probe: Option<Arc<InMemoryResourceStore>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store_probe(store: Arc<InMemoryResourceStore>) -> Self {
        Self {
            probe: Some(store),
            ..Self::default()
        }
    }

    pub fn published_tasks(&self) -> Vec<TaskMessage> {
        self.tasks.lock().clone()
    }

    pub fn raw_messages(&self) -> Vec<(String, serde_json::Value)> {
        self.raw.lock().clone()
    }

    pub fn task_records_seen_at_publish(&self) -> Vec<bool> {
        self.task_seen_at_publish.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty() && self.raw.lock().is_empty()
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn publish(
        &self,
        subject: &str,
        message: serde_json::Value,
    ) -> Result<(), MessagingError> {
        self.raw.lock().push((subject.to_string(), message));
        Ok(())
    }

    async fn publish_provisioning_task(&self, message: &TaskMessage) -> Result<(), MessagingError> {
        if let Some(ref store) = self.probe {
            let seen = store
                .get_task(message.task_id)
                .await
                .map(|t| t.is_some())
                .unwrap_or(false);
            self.task_seen_at_publish.lock().push(seen);
        }

        self.tasks.lock().push(message.clone());
        Ok(())
    }
}

/// Storage provisioner double that either succeeds with a descriptor or
/// fails with a connection error, recording every call.
#[derive(Default)]
pub struct StubProvisioner {
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubProvisioner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StorageProvisioner for StubProvisioner {
    async fn prepare(
        &self,
        database: &str,
        schema: &str,
    ) -> Result<ConnectionDescriptor, ProvisionerError> {
        self.calls
            .lock()
            .push((database.to_string(), schema.to_string()));

        if self.fail {
            return Err(ProvisionerError::Connect {
                database: database.to_string(),
                source: sqlx::Error::PoolClosed,
            });
        }

        Ok(ConnectionDescriptor::new(database, schema))
    }
}
