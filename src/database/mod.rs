//! # Database Operations
//!
//! Storage preparation for tenant instances.

pub mod provisioner;

pub use provisioner::{
    ConnectionDescriptor, DatabaseProvisioner, ProvisionerError, StorageProvisioner,
};
