//! # Message Bus Contract
//!
//! The publish seam between the orchestration core and whatever transport
//! delivers task messages to the worker pool. Delivery is at-least-once;
//! consumers and the database provisioner are expected to be idempotent
//! under redelivery.

use super::errors::MessagingError;
use super::message::TaskMessage;
use crate::constants::PROVISIONING_QUEUE;
use async_trait::async_trait;

/// Publish-side contract required from a message transport
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a raw JSON message to an arbitrary subject
    async fn publish(
        &self,
        subject: &str,
        message: serde_json::Value,
    ) -> Result<(), MessagingError>;

    /// Publish a task message to the provisioning subject consumed by the
    /// worker pool.
    async fn publish_provisioning_task(&self, message: &TaskMessage) -> Result<(), MessagingError> {
        let payload = message.to_json()?;
        self.publish(PROVISIONING_QUEUE, payload).await
    }
}
