//! # Task and Tenant State Management
//!
//! States, events, and the pure transition table for asynchronous
//! provisioning operations and tenant lifecycles.

pub mod events;
pub mod states;
pub mod transitions;

pub use events::TaskEvent;
pub use states::{TaskStatus, TenantStatus};
pub use transitions::{next_task_status, StateMachineError};
