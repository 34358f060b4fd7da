//! # Provisioning Configuration
//!
//! Typed, validated-at-startup configuration for the provisioning core.
//! Replaces string-keyed configuration lookups with a concrete struct that
//! drives tenant addressing and database naming.

use crate::error::{Result, TenancyError};
use crate::models::{DeploymentType, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// Maintenance-database URL used by the database provisioner
    pub admin_database_url: String,
    /// Database holding every `Shared` tenant, isolated by schema
    pub shared_database: String,
    /// Prefix for per-customer databases of `Dedicated` tenants
    pub dedicated_database_prefix: String,
    /// Domain used for tenant addressing outside local development
    pub production_domain: String,
    /// Map tenants to local ports instead of production hostnames
    pub use_local_addressing: bool,
    /// Port assigned to tenants when no product override exists
    pub default_public_port: u16,
    /// Per-product port overrides, keyed by product code
    pub product_port_overrides: HashMap<String, u16>,
    /// Queue subject for provisioning task messages
    pub provisioning_queue: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            environment: crate::constants::system::DEFAULT_ENVIRONMENT.to_string(),
            admin_database_url: "postgresql://localhost/postgres".to_string(),
            shared_database: "tenants_shared".to_string(),
            dedicated_database_prefix: "tenant_".to_string(),
            production_domain: "tenancy.app".to_string(),
            use_local_addressing: true,
            default_public_port: 8080,
            product_port_overrides: HashMap::new(),
            provisioning_queue: crate::constants::PROVISIONING_QUEUE.to_string(),
        }
    }
}

impl ProvisioningConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(environment) = std::env::var("TENANCY_ENV") {
            config.environment = environment;
        }

        if let Ok(admin_url) = std::env::var("TENANCY_ADMIN_DATABASE_URL") {
            config.admin_database_url = admin_url;
        }

        if let Ok(shared) = std::env::var("TENANCY_SHARED_DATABASE") {
            config.shared_database = shared;
        }

        if let Ok(prefix) = std::env::var("TENANCY_DEDICATED_DATABASE_PREFIX") {
            config.dedicated_database_prefix = prefix;
        }

        if let Ok(domain) = std::env::var("TENANCY_PRODUCTION_DOMAIN") {
            config.production_domain = domain;
        }

        if let Ok(local) = std::env::var("TENANCY_USE_LOCAL_ADDRESSING") {
            config.use_local_addressing = local.parse().map_err(|e| {
                TenancyError::ConfigurationError(format!("Invalid use_local_addressing: {e}"))
            })?;
        }

        if let Ok(port) = std::env::var("TENANCY_DEFAULT_PUBLIC_PORT") {
            config.default_public_port = port.parse().map_err(|e| {
                TenancyError::ConfigurationError(format!("Invalid default_public_port: {e}"))
            })?;
        }

        if let Ok(queue) = std::env::var("TENANCY_PROVISIONING_QUEUE") {
            config.provisioning_queue = queue;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, layered with `TENANCY__`-prefixed
    /// environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("TENANCY").separator("__"))
            .build()
            .map_err(|e| {
                TenancyError::ConfigurationError(format!("Failed to load config from {path}: {e}"))
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            TenancyError::ConfigurationError(format!("Invalid configuration in {path}: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce valid addressing or
    /// database names.
    pub fn validate(&self) -> Result<()> {
        if self.shared_database.trim().is_empty() {
            return Err(TenancyError::ConfigurationError(
                "shared_database must not be blank".to_string(),
            ));
        }
        if !self.use_local_addressing && self.production_domain.trim().is_empty() {
            return Err(TenancyError::ConfigurationError(
                "production_domain required when local addressing is disabled".to_string(),
            ));
        }
        if self.provisioning_queue.trim().is_empty() {
            return Err(TenancyError::ConfigurationError(
                "provisioning_queue must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Public API base address for a tenant.
    ///
    /// Local development maps tenants to ports (with a per-product override
    /// when configured); everywhere else tenants get a subdomain of the
    /// production domain.
    pub fn api_base_url(&self, tenant_code: &str, product: &Product) -> String {
        if self.use_local_addressing {
            let port = self
                .product_port_overrides
                .get(&product.code)
                .copied()
                .unwrap_or(self.default_public_port);
            format!("http://localhost:{port}")
        } else {
            format!("https://{tenant_code}.{}", self.production_domain)
        }
    }

    /// Target database for a tenant: one shared database for `Shared`
    /// tenants, one database per customer for `Dedicated` tenants.
    pub fn database_for(&self, deployment_type: DeploymentType, customer_code: &str) -> String {
        match deployment_type {
            DeploymentType::Shared => self.shared_database.clone(),
            DeploymentType::Dedicated => {
                format!("{}{customer_code}", self.dedicated_database_prefix)
            }
        }
    }
}
