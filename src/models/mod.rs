pub mod customer;
pub mod product;
pub mod subscription_plan;
pub mod task;
pub mod tenant_instance;

// Re-export core models for easy access
pub use customer::Customer;
pub use product::Product;
pub use subscription_plan::{PlanFeature, SubscriptionPlan};
pub use task::Task;
pub use tenant_instance::{DeploymentType, TenantInstance};
