#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tenancy Core
//!
//! Rust core of a multi-tenant provisioning platform: given a customer, a
//! product, and a subscription plan, it validates eligibility, allocates a
//! uniquely-identified tenant instance, prepares its backing database and
//! schema, and fans out module activation to an external worker pool via
//! asynchronous messages — while tracking the lifecycle and outcome of
//! every such operation.
//!
//! ## Architecture
//!
//! The crate is the **orchestration core** behind a request-handling
//! layer. Each public operation executes synchronously to completion and
//! returns once the work has been handed off, not once it is done: the
//! actual module activation happens out-of-process in workers consuming
//! the provisioning queue, which report back through the task tracker.
//!
//! ## Module Organization
//!
//! - [`models`] - Tenant, catalog, and task records
//! - [`orchestration`] - Provisioning orchestrator, operation queue, task tracker
//! - [`state_machine`] - Task and tenant lifecycle state management
//! - [`messaging`] - Task message contract and queue transports
//! - [`database`] - Idempotent tenant storage preparation
//! - [`store`] - Resource store contract and in-memory implementation
//! - [`config`] - Typed configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenancy_core::config::ProvisioningConfig;
//! use tenancy_core::database::DatabaseProvisioner;
//! use tenancy_core::messaging::PgmqMessageBus;
//! use tenancy_core::orchestration::{ProvisioningOrchestrator, ProvisionRequest};
//! use tenancy_core::store::InMemoryResourceStore;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProvisioningConfig::from_env()?;
//! let store = Arc::new(InMemoryResourceStore::new());
//! let bus = Arc::new(PgmqMessageBus::new(&config.admin_database_url).await?);
//! let provisioner = Arc::new(DatabaseProvisioner::new(config.admin_database_url.clone()));
//!
//! let orchestrator = ProvisioningOrchestrator::new(store, bus, provisioner, config);
//!
//! let request = ProvisionRequest::new(
//!     Uuid::new_v4(), // customer
//!     Uuid::new_v4(), // product
//!     Uuid::new_v4(), // subscription plan
//!     "Acme CRM",
//! );
//! let receipt = orchestrator.provision_tenant(request).await?;
//! println!("Tenant {} is provisioning (task {})", receipt.tenant_code, receipt.task_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;
pub mod validation;

pub use config::ProvisioningConfig;
pub use constants::PROVISIONING_QUEUE;
pub use database::{ConnectionDescriptor, DatabaseProvisioner, StorageProvisioner};
pub use error::{Result, TenancyError};
pub use messaging::{MessageBus, ModuleTarget, TaskMessage, TaskType};
pub use models::{Customer, DeploymentType, Product, SubscriptionPlan, Task, TenantInstance};
pub use orchestration::{
    AsyncOperationQueue, OrchestrationError, ProvisionReceipt, ProvisionRequest,
    ProvisioningOrchestrator, QueuedOperation, TaskTracker, ValidationErrorKind,
};
pub use state_machine::{TaskStatus, TenantStatus};
pub use store::{InMemoryResourceStore, ResourceStore, StoreError};
