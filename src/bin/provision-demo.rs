//! # Provisioning Demo
//!
//! Wires the orchestrator against a live PostgreSQL instance (resource
//! store in memory, pgmq transport, real database provisioner) and runs a
//! single provision request end to end. Intended for local smoke testing:
//!
//! ```bash
//! TENANCY_ADMIN_DATABASE_URL=postgresql://localhost/postgres cargo run --bin provision-demo
//! ```

use anyhow::Context;
use std::sync::Arc;
use tenancy_core::config::ProvisioningConfig;
use tenancy_core::database::DatabaseProvisioner;
use tenancy_core::logging::init_structured_logging;
use tenancy_core::messaging::PgmqMessageBus;
use tenancy_core::models::{Customer, PlanFeature, Product, SubscriptionPlan};
use tenancy_core::orchestration::{ProvisionRequest, ProvisioningOrchestrator};
use tenancy_core::store::InMemoryResourceStore;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = ProvisioningConfig::from_env().context("loading provisioning config")?;

    let store = Arc::new(InMemoryResourceStore::new());
    let bus = Arc::new(
        PgmqMessageBus::new(&config.admin_database_url)
            .await
            .context("connecting to the pgmq transport")?,
    );
    let provisioner = Arc::new(DatabaseProvisioner::new(config.admin_database_url.clone()));

    // Seed a demo catalog: one customer, one product, one plan spanning
    // two modules
    let customer = Customer::new(Uuid::new_v4(), "acme", "Acme Inc.");
    let product = Product::new(Uuid::new_v4(), "crm", "Acme CRM");
    let plan = SubscriptionPlan::new(Uuid::new_v4(), product.id, "Growth").with_features(vec![
        PlanFeature::enabled(Uuid::new_v4(), "reports"),
        PlanFeature::enabled(Uuid::new_v4(), "billing"),
    ]);
    store.insert_customer(customer.clone());
    store.insert_product(product.clone());
    store.insert_subscription_plan(plan.clone());

    let orchestrator = ProvisioningOrchestrator::new(store, bus, provisioner, config);

    let request = ProvisionRequest::new(customer.id, product.id, plan.id, "Acme CRM")
        .with_requested_by("provision-demo");
    let receipt = orchestrator
        .provision_tenant(request)
        .await
        .context("provisioning demo tenant")?;

    info!(
        tenant_code = %receipt.tenant_code,
        task_id = %receipt.task_id,
        status = %receipt.status,
        "Demo tenant handed off to the worker pool"
    );
    println!(
        "provisioned {} (instance {}, tracking task {})",
        receipt.tenant_code, receipt.tenant_instance_id, receipt.task_id
    );

    Ok(())
}
