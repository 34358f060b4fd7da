//! # PostgreSQL Message Queue Bus (pgmq-rs)
//!
//! [`MessageBus`] implementation backed by the pgmq-rs crate. Queues are
//! created on first use, so publishing to a fresh subject needs no prior
//! setup step.

use super::bus::MessageBus;
use super::errors::MessagingError;
use async_trait::async_trait;
use pgmq::PGMQueue;
use tracing::{debug, info};

/// pgmq-backed message bus
#[derive(Debug, Clone)]
pub struct PgmqMessageBus {
    pgmq: PGMQueue,
}

impl PgmqMessageBus {
    /// Create a new bus using a connection string
    pub async fn new(database_url: &str) -> Result<Self, MessagingError> {
        let pgmq = PGMQueue::new(database_url.to_string()).await.map_err(|e| {
            MessagingError::TransportConnection {
                message: format!("Failed to connect to pgmq: {e}"),
            }
        })?;

        info!("✅ Connected to pgmq transport");
        Ok(Self { pgmq })
    }

    /// Create a new bus using an existing connection pool
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        let pgmq = PGMQueue::new_with_pool(pool).await;

        info!("✅ pgmq bus created with shared connection pool");
        Self { pgmq }
    }

    /// Create a queue if it doesn't exist
    pub async fn ensure_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        debug!("📋 Ensuring queue exists: {}", queue_name);

        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "create", e))?;

        Ok(())
    }
}

#[async_trait]
impl MessageBus for PgmqMessageBus {
    async fn publish(
        &self,
        subject: &str,
        message: serde_json::Value,
    ) -> Result<(), MessagingError> {
        self.ensure_queue(subject).await?;

        let message_id = self
            .pgmq
            .send(subject, &message)
            .await
            .map_err(|e| MessagingError::queue_operation(subject, "send", e))?;

        debug!(
            queue = subject,
            message_id = message_id,
            "📤 Message published"
        );
        Ok(())
    }
}
