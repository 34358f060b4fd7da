//! Subscription plans: priced bundles of enabled features that determine
//! which modules a tenant instance activates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One feature entry on a plan. Features belong to modules; a feature only
/// contributes its module to activation when it is enabled and not deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFeature {
    pub feature_id: Uuid,
    /// Module the feature belongs to
    pub module_id: String,
    pub enabled: bool,
    pub deleted: bool,
}

impl PlanFeature {
    pub fn enabled(feature_id: Uuid, module_id: impl Into<String>) -> Self {
        Self {
            feature_id,
            module_id: module_id.into(),
            enabled: true,
            deleted: false,
        }
    }

    pub fn disabled(feature_id: Uuid, module_id: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::enabled(feature_id, module_id)
        }
    }

    pub fn soft_deleted(feature_id: Uuid, module_id: impl Into<String>) -> Self {
        Self {
            deleted: true,
            ..Self::enabled(feature_id, module_id)
        }
    }
}

/// Subscription plan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    /// Product this plan belongs to
    pub product_id: Uuid,
    pub name: String,
    pub active: bool,
    pub features: Vec<PlanFeature>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn new(id: Uuid, product_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            product_id,
            name: name.into(),
            active: true,
            features: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_features(mut self, features: Vec<PlanFeature>) -> Self {
        self.features = features;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Distinct module ids referenced by the plan's enabled, non-deleted
    /// features, in first-seen order. This is the module-activation set a
    /// provisioning operation fans out over.
    pub fn enabled_module_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.features
            .iter()
            .filter(|f| f.enabled && !f.deleted)
            .filter(|f| seen.insert(f.module_id.clone()))
            .map(|f| f.module_id.clone())
            .collect()
    }
}
