//! # Queue-Based Messaging
//!
//! Wire contract and transport implementations for handing asynchronous
//! work to the provisioning worker pool.

pub mod bus;
pub mod errors;
pub mod message;
pub mod pgmq_client;

pub use bus::MessageBus;
pub use errors::MessagingError;
pub use message::{payload_keys, ModuleTarget, TaskMessage, TaskType};
pub use pgmq_client::PgmqMessageBus;
