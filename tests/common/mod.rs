//! Shared fixtures for the integration suite: seeded catalog records and a
//! fully wired orchestrator harness over the in-memory store.

#![allow(dead_code)]

use crate::mocks::{RecordingBus, StubProvisioner};
use std::sync::Arc;
use tenancy_core::config::ProvisioningConfig;
use tenancy_core::models::{Customer, PlanFeature, Product, SubscriptionPlan};
use tenancy_core::orchestration::{ProvisionRequest, ProvisioningOrchestrator};
use tenancy_core::store::InMemoryResourceStore;
use uuid::Uuid;

pub struct Harness {
    pub store: Arc<InMemoryResourceStore>,
    pub bus: Arc<RecordingBus>,
    pub provisioner: Arc<StubProvisioner>,
    pub orchestrator:
        ProvisioningOrchestrator<InMemoryResourceStore, RecordingBus, StubProvisioner>,
}

pub fn harness() -> Harness {
    build_harness(StubProvisioner::succeeding())
}

pub fn harness_with_failing_storage() -> Harness {
    build_harness(StubProvisioner::failing())
}

fn build_harness(provisioner: StubProvisioner) -> Harness {
    let store = Arc::new(InMemoryResourceStore::new());
    let bus = Arc::new(RecordingBus::with_store_probe(store.clone()));
    let provisioner = Arc::new(provisioner);

    let orchestrator = ProvisioningOrchestrator::new(
        store.clone(),
        bus.clone(),
        provisioner.clone(),
        ProvisioningConfig::default(),
    );

    Harness {
        store,
        bus,
        provisioner,
        orchestrator,
    }
}

pub fn active_customer(code: &str) -> Customer {
    Customer::new(Uuid::new_v4(), code, format!("{code} Inc."))
}

pub fn active_product(code: &str) -> Product {
    Product::new(Uuid::new_v4(), code, format!("{code} product"))
}

/// Plan for `product` with one enabled feature per module
pub fn plan_with_modules(product: &Product, modules: &[&str]) -> SubscriptionPlan {
    let features = modules
        .iter()
        .map(|module| PlanFeature::enabled(Uuid::new_v4(), *module))
        .collect();
    SubscriptionPlan::new(Uuid::new_v4(), product.id, "Growth").with_features(features)
}

/// Seed an active customer/product/plan triple and return it
pub fn seed_catalog(
    store: &InMemoryResourceStore,
    modules: &[&str],
) -> (Customer, Product, SubscriptionPlan) {
    let customer = active_customer("acme");
    let product = active_product("crm");
    let plan = plan_with_modules(&product, modules);

    store.insert_customer(customer.clone());
    store.insert_product(product.clone());
    store.insert_subscription_plan(plan.clone());

    (customer, product, plan)
}

pub fn provision_request(
    customer: &Customer,
    product: &Product,
    plan: &SubscriptionPlan,
) -> ProvisionRequest {
    ProvisionRequest::new(customer.id, product.id, plan.id, "Acme CRM")
        .with_requested_by("integration-test")
}
