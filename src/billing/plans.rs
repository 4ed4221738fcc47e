//! Plan and subscription-status vocabulary.
//!
//! Both enums are closed sets: stored values outside them are never trusted.
//! Per-plan limits and features are static tables keyed by plan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    /// Free tier.
    #[default]
    Free,
    /// Paid tier.
    Pro,
}

impl PlanId {
    /// Parse a stored plan id string.
    ///
    /// Returns `None` for anything outside the closed set; invalid stored
    /// values must be discarded, never trusted.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            _ => None,
        }
    }

    /// Convert to the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    /// Resource limits for this plan.
    #[must_use]
    pub const fn limits(&self) -> PlanLimits {
        match self {
            Self::Free => PlanLimits {
                max_estates: Some(1),
                max_collaborators_per_estate: Some(2),
                max_storage_mb: Some(250),
            },
            Self::Pro => PlanLimits {
                max_estates: None,
                max_collaborators_per_estate: None,
                max_storage_mb: Some(10_240),
            },
        }
    }

    /// Features available on this plan.
    #[must_use]
    pub const fn features(&self) -> PlanFeatures {
        match self {
            Self::Free => PlanFeatures {
                exports: false,
                advanced_reports: false,
                collaborator_invites: false,
            },
            Self::Pro => PlanFeatures {
                exports: true,
                advanced_reports: true,
                collaborator_invites: true,
            },
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No paid subscription.
    #[default]
    Free,
    /// Subscription is active and paid.
    Active,
    /// Subscription is in trial period.
    Trialing,
    /// Payment failed, subscription degraded but not yet canceled.
    PastDue,
    /// Subscription has been canceled.
    Canceled,
}

impl SubscriptionStatus {
    /// Parse a stored status string.
    ///
    /// Returns `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Normalize a payment-provider status string into the closed set.
    ///
    /// The provider's vocabulary is wider than ours; every state that does
    /// not grant service maps to `Canceled`.
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            _ => Self::Canceled, // incomplete, unpaid, paused, unknown
        }
    }

    /// Convert to the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Check if the subscription is in good standing (active or trialing).
    ///
    /// `past_due` is deliberately excluded: a failed payment degrades
    /// entitlements even while the stored plan id still says pro.
    #[must_use]
    pub fn is_good_standing(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource limits for a plan.
///
/// `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    /// Maximum number of estates per owner.
    pub max_estates: Option<u32>,
    /// Maximum collaborators per estate.
    pub max_collaborators_per_estate: Option<u32>,
    /// Maximum document storage in MB.
    pub max_storage_mb: Option<u64>,
}

/// Features available on a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanFeatures {
    /// Export estate data (PDF/CSV).
    pub exports: bool,
    /// Advanced reporting views.
    pub advanced_reports: bool,
    /// Inviting collaborators by email.
    pub collaborator_invites: bool,
}

impl PlanFeatures {
    /// Check whether a feature is included.
    #[must_use]
    pub fn has(&self, feature: FeatureKey) -> bool {
        match feature {
            FeatureKey::Exports => self.exports,
            FeatureKey::AdvancedReports => self.advanced_reports,
            FeatureKey::CollaboratorInvites => self.collaborator_invites,
        }
    }
}

/// Gatable feature keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    /// Export estate data.
    Exports,
    /// Advanced reporting views.
    AdvancedReports,
    /// Inviting collaborators by email.
    CollaboratorInvites,
}

impl FeatureKey {
    /// Get the string representation of the feature key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exports => "exports",
            Self::AdvancedReports => "advanced_reports",
            Self::CollaboratorInvites => "collaborator_invites",
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps the payment provider's price ids onto plans.
///
/// Webhook events carry price ids, not plan names; the catalog is how
/// subscription events are translated into a [`PlanId`].
///
/// # Example
///
/// ```rust
/// use executry::billing::{PlanCatalog, PlanId};
///
/// let catalog = PlanCatalog::new().with_price("price_pro_monthly", PlanId::Pro);
/// assert_eq!(catalog.plan_for_price("price_pro_monthly"), Some(PlanId::Pro));
/// assert_eq!(catalog.plan_for_price("price_unknown"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    prices: HashMap<String, PlanId>,
}

impl PlanCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a price id for a plan.
    #[must_use]
    pub fn with_price(mut self, price_id: impl Into<String>, plan: PlanId) -> Self {
        self.prices.insert(price_id.into(), plan);
        self
    }

    /// Look up the plan for a price id.
    #[must_use]
    pub fn plan_for_price(&self, price_id: &str) -> Option<PlanId> {
        self.prices.get(price_id).copied()
    }

    /// Number of registered prices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Check if the catalog has no prices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
