//! # Messaging Error Types
//!
//! Structured error handling for the messaging system using thiserror
//! instead of `Box<dyn Error>` patterns.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("Transport connection error: {message}")]
    TransportConnection { message: String },
}

impl MessagingError {
    /// Helper for queue operation failures
    pub fn queue_operation(queue_name: &str, operation: &str, message: impl ToString) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.to_string(),
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        Self::MessageSerialization {
            message: err.to_string(),
        }
    }
}
