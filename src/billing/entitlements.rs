//! Entitlement resolution and feature gating.
//!
//! Entitlements are derived on demand from the raw plan and status strings
//! on a [`BillingProfile`](super::storage::BillingProfile). Resolution never
//! fails: values outside the known vocabulary are discarded and the result
//! degrades toward the free tier.

use super::error::BillingError;
use super::plans::{FeatureKey, PlanFeatures, PlanId, PlanLimits, SubscriptionStatus};
use super::storage::BillingStore;
use crate::error::Result;

/// Resolve entitlements from stored plan and status values.
///
/// The stored plan wins when it parses. Without one, a subscription in good
/// standing implies the pro plan (checkout events can land before the plan
/// field is written); otherwise the user is on the free plan. Limits and
/// features always come from the effective plan, so a pro subscriber whose
/// payment is past due is served free-tier limits until payment recovers.
pub fn resolve_entitlements(plan_id: Option<&str>, status: Option<&str>) -> Entitlements {
    let parsed_plan = plan_id.and_then(PlanId::parse);
    let status = status
        .and_then(SubscriptionStatus::parse)
        .unwrap_or_default();

    let is_active = status.is_good_standing();
    let plan_id = parsed_plan.unwrap_or(if is_active { PlanId::Pro } else { PlanId::Free });
    let can_use_pro = plan_id == PlanId::Pro && is_active;
    let effective_plan = if can_use_pro { PlanId::Pro } else { PlanId::Free };

    Entitlements {
        plan_id,
        effective_plan,
        status,
        is_active,
        can_use_pro,
        limits: effective_plan.limits(),
        features: effective_plan.features(),
    }
}

/// Resolved entitlements for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Entitlements {
    /// The plan the user is on.
    pub plan_id: PlanId,
    /// The plan actually honored. Differs from `plan_id` when the
    /// subscription is not in good standing.
    pub effective_plan: PlanId,
    /// Normalized subscription status.
    pub status: SubscriptionStatus,
    /// Whether the subscription is in good standing.
    pub is_active: bool,
    /// Whether pro functionality is usable right now.
    pub can_use_pro: bool,
    /// Resource limits from the effective plan.
    pub limits: PlanLimits,
    /// Features from the effective plan.
    pub features: PlanFeatures,
}

impl Entitlements {
    /// Entitlements for a user with no billing profile.
    #[must_use]
    pub fn free() -> Self {
        resolve_entitlements(None, None)
    }

    /// Check if a feature is available.
    #[must_use]
    pub fn has_feature(&self, feature: FeatureKey) -> bool {
        self.features.has(feature)
    }

    /// Require usable pro access.
    pub fn require_pro(&self) -> std::result::Result<(), BillingError> {
        if self.can_use_pro {
            Ok(())
        } else {
            Err(BillingError::requires_plan(PlanId::Pro))
        }
    }

    /// Require a specific feature.
    pub fn require_feature(&self, feature: FeatureKey) -> std::result::Result<(), BillingError> {
        if self.has_feature(feature) {
            Ok(())
        } else {
            Err(BillingError::requires_feature(PlanId::Pro, feature))
        }
    }

    /// Check the estate count against the plan limit.
    #[must_use]
    pub fn check_estate_limit(&self, current: u32) -> LimitCheckResult {
        check_against(u64::from(current), self.limits.max_estates.map(u64::from))
    }

    /// Check an estate's collaborator count against the plan limit.
    #[must_use]
    pub fn check_collaborator_limit(&self, current: u32) -> LimitCheckResult {
        check_against(
            u64::from(current),
            self.limits.max_collaborators_per_estate.map(u64::from),
        )
    }

    /// Check document storage usage against the plan limit.
    #[must_use]
    pub fn check_storage_limit(&self, current_mb: u64) -> LimitCheckResult {
        check_against(current_mb, self.limits.max_storage_mb)
    }
}

fn check_against(current: u64, limit: Option<u64>) -> LimitCheckResult {
    match limit {
        None => LimitCheckResult::Unlimited,
        Some(max) => {
            if current < max {
                LimitCheckResult::WithinLimit { current, max }
            } else {
                LimitCheckResult::AtLimit { current, max }
            }
        }
    }
}

/// Result of checking a resource limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitCheckResult {
    /// No limit on this resource.
    Unlimited,
    /// Usage is within the limit.
    WithinLimit { current: u64, max: u64 },
    /// Usage has reached or exceeded the limit.
    AtLimit { current: u64, max: u64 },
}

impl LimitCheckResult {
    /// Check if usage is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::WithinLimit { .. })
    }

    /// Check if at or over limit.
    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        matches!(self, Self::AtLimit { .. })
    }
}

/// Entitlements manager for checking plan access.
///
/// Use this to gate features based on a user's subscription.
pub struct EntitlementsManager<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> EntitlementsManager<S> {
    /// Create a new entitlements manager.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the entitlements for a user.
    ///
    /// A user without a billing profile gets free-tier entitlements.
    pub async fn entitlements_for(&self, user_id: &str) -> Result<Entitlements> {
        let profile = self.store.get_profile(user_id).await?;

        Ok(match profile {
            Some(profile) => {
                resolve_entitlements(profile.plan_id.as_deref(), profile.status.as_deref())
            }
            None => Entitlements::free(),
        })
    }

    /// Check if the user can use pro functionality right now.
    pub async fn can_use_pro(&self, user_id: &str) -> Result<bool> {
        Ok(self.entitlements_for(user_id).await?.can_use_pro)
    }

    /// Check if a feature is available to the user.
    pub async fn has_feature(&self, user_id: &str, feature: FeatureKey) -> Result<bool> {
        Ok(self.entitlements_for(user_id).await?.has_feature(feature))
    }

    /// Require usable pro access for the user.
    pub async fn require_pro(&self, user_id: &str) -> Result<()> {
        self.entitlements_for(user_id)
            .await?
            .require_pro()
            .map_err(Into::into)
    }

    /// Require a feature for the user.
    pub async fn require_feature(&self, user_id: &str, feature: FeatureKey) -> Result<()> {
        self.entitlements_for(user_id)
            .await?
            .require_feature(feature)
            .map_err(Into::into)
    }

    /// Check the user's estate count against their plan limit.
    pub async fn check_estate_limit(
        &self,
        user_id: &str,
        current: u32,
    ) -> Result<LimitCheckResult> {
        Ok(self.entitlements_for(user_id).await?.check_estate_limit(current))
    }
}

/// Plan-aware quota checker for estate management.
///
/// Bridges [`EstateQuota`](crate::estates::EstateQuota) to resolved
/// entitlements, so estate and collaborator creation respect the owner's
/// plan limits.
pub struct EntitlementQuota<S: BillingStore> {
    entitlements: EntitlementsManager<S>,
}

impl<S: BillingStore> EntitlementQuota<S> {
    /// Create a quota checker backed by a billing store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            entitlements: EntitlementsManager::new(store),
        }
    }
}

#[async_trait::async_trait]
impl<S: BillingStore> crate::estates::EstateQuota for EntitlementQuota<S> {
    async fn can_create_estate(&self, owner_id: &str, current_count: u32) -> Result<bool> {
        let entitlements = self.entitlements.entitlements_for(owner_id).await?;
        Ok(entitlements.check_estate_limit(current_count).is_allowed())
    }

    async fn estate_limit(&self, owner_id: &str) -> Result<Option<u32>> {
        let entitlements = self.entitlements.entitlements_for(owner_id).await?;
        Ok(entitlements.limits.max_estates)
    }

    async fn can_add_collaborator(&self, owner_id: &str, current_count: u32) -> Result<bool> {
        let entitlements = self.entitlements.entitlements_for(owner_id).await?;
        Ok(entitlements.check_collaborator_limit(current_count).is_allowed())
    }

    async fn collaborator_limit(&self, owner_id: &str) -> Result<Option<u32>> {
        let entitlements = self.entitlements.entitlements_for(owner_id).await?;
        Ok(entitlements.limits.max_collaborators_per_estate)
    }
}
