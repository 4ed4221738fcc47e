//! Storage trait for billing data.
//!
//! Implement this trait to persist billing state to your database.
//! An in-memory implementation is provided for testing.

use super::plans::{PlanId, SubscriptionStatus};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long processed webhook event ids are retained before TTL cleanup.
///
/// The payment provider stops redelivering events well inside this window,
/// so an id that has aged out can no longer arrive as a duplicate.
pub const EVENT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Trait for storing billing data.
///
/// `claim_event` must be atomic: it is the sole idempotency mechanism for
/// webhook processing, and concurrent claims of the same event id must
/// produce exactly one [`EventClaim::New`]. Back it with a unique index or
/// equivalent single-writer primitive.
#[async_trait]
pub trait BillingStore: Send + Sync {
    // Billing profiles

    /// Get the billing profile for a user.
    async fn get_profile(&self, user_id: &str) -> Result<Option<BillingProfile>>;

    /// Save/replace a billing profile.
    async fn save_profile(&self, profile: &BillingProfile) -> Result<()>;

    /// Find the user linked to a payment-provider customer.
    async fn find_user_by_customer(&self, customer_id: &str) -> Result<Option<String>>;

    /// Link a user to a payment-provider customer.
    ///
    /// Creates the profile if none exists; replaces any previous linkage.
    async fn set_customer_id(&self, user_id: &str, customer_id: &str) -> Result<()>;

    /// Write subscription-derived fields back onto the user's profile.
    ///
    /// Creates the profile if none exists. All four fields are replaced:
    /// the inbound event describes the whole subscription state.
    async fn apply_subscription_update(
        &self,
        user_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<()>;

    /// Update only the subscription status on the user's profile.
    ///
    /// Used by invoice events, which carry payment state but no plan
    /// information. A no-op if the profile does not exist.
    async fn set_subscription_status(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
    ) -> Result<()>;

    // Webhook idempotency

    /// Claim a webhook event id for processing.
    ///
    /// Insert-first: the claim is the atomic arbiter. Returns
    /// [`EventClaim::New`] for exactly one caller per event id; every other
    /// concurrent or later claim gets [`EventClaim::Duplicate`].
    async fn claim_event(&self, event_id: &str, event_type: &str) -> Result<EventClaim>;

    /// Release a claimed event id after a failed application.
    ///
    /// Lets the provider's redelivery of the same event claim it afresh.
    async fn release_event(&self, event_id: &str) -> Result<()>;

    // Optional: cleanup expired events

    /// Remove claimed event ids older than the retention window (default: no-op).
    ///
    /// Returns the number of records removed. Suitable for a periodic job;
    /// stores with native TTL indexes can rely on the default.
    async fn cleanup_expired_events(&self, _retention: Duration) -> Result<usize> {
        Ok(0)
    }
}

/// A user's billing snapshot.
///
/// `plan_id` and `status` are stored as raw strings and validated against
/// the closed enums only during entitlement resolution; stored values
/// outside the vocabulary are discarded there, never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingProfile {
    /// The user this profile belongs to.
    pub user_id: String,
    /// Billing email, used when provisioning a provider customer.
    pub email: Option<String>,
    /// Payment-provider customer id.
    pub customer_id: Option<String>,
    /// Payment-provider subscription id.
    pub subscription_id: Option<String>,
    /// Raw stored plan id.
    pub plan_id: Option<String>,
    /// Raw stored subscription status.
    pub status: Option<String>,
}

impl BillingProfile {
    /// Create an empty profile for a user.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            customer_id: None,
            subscription_id: None,
            plan_id: None,
            status: None,
        }
    }

    /// Set the billing email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Subscription fields written back by webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    /// Plan inferred from the subscription's price id; `None` clears it.
    pub plan_id: Option<PlanId>,
    /// Normalized subscription status.
    pub status: SubscriptionStatus,
    /// Provider subscription id; `None` clears it.
    pub subscription_id: Option<String>,
    /// Provider customer id.
    pub customer_id: String,
}

/// Outcome of claiming a webhook event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the claim decides whether the event's side effects run"]
pub enum EventClaim {
    /// First claim of this event id; the caller must apply side effects.
    New,
    /// The event id was already claimed; side effects must be skipped.
    Duplicate,
}

impl EventClaim {
    /// Check if this is the first claim.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

/// In-memory billing store for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use crate::utils::current_timestamp;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory billing store for testing.
    ///
    /// Wraps data in Arc for cheap cloning. The event-claim map is guarded
    /// by a single lock, giving the same exactly-one-new guarantee a unique
    /// index provides.
    #[derive(Default, Clone)]
    pub struct InMemoryBillingStore {
        inner: Arc<InMemoryBillingStoreInner>,
    }

    #[derive(Default)]
    struct InMemoryBillingStoreInner {
        profiles: RwLock<HashMap<String, BillingProfile>>,
        claimed_events: RwLock<HashMap<String, ClaimedEvent>>,
    }

    #[derive(Clone)]
    struct ClaimedEvent {
        #[allow(dead_code)]
        event_type: String,
        claimed_at: u64,
    }

    impl InMemoryBillingStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all claimed event ids (for testing).
        pub fn get_claimed_events(&self) -> Vec<String> {
            self.inner
                .claimed_events
                .read()
                .unwrap()
                .keys()
                .cloned()
                .collect()
        }

        /// Seed a billing profile for testing.
        pub fn seed_profile(&self, profile: BillingProfile) {
            self.inner
                .profiles
                .write()
                .unwrap()
                .insert(profile.user_id.clone(), profile);
        }

        /// Backdate an event claim (for retention tests).
        pub fn backdate_event(&self, event_id: &str, claimed_at: u64) {
            let mut events = self.inner.claimed_events.write().unwrap();
            if let Some(event) = events.get_mut(event_id) {
                event.claimed_at = claimed_at;
            }
        }
    }

    #[async_trait]
    impl BillingStore for InMemoryBillingStore {
        async fn get_profile(&self, user_id: &str) -> Result<Option<BillingProfile>> {
            Ok(self.inner.profiles.read().unwrap().get(user_id).cloned())
        }

        async fn save_profile(&self, profile: &BillingProfile) -> Result<()> {
            self.inner
                .profiles
                .write()
                .unwrap()
                .insert(profile.user_id.clone(), profile.clone());
            Ok(())
        }

        async fn find_user_by_customer(&self, customer_id: &str) -> Result<Option<String>> {
            let profiles = self.inner.profiles.read().unwrap();
            Ok(profiles
                .values()
                .find(|p| p.customer_id.as_deref() == Some(customer_id))
                .map(|p| p.user_id.clone()))
        }

        async fn set_customer_id(&self, user_id: &str, customer_id: &str) -> Result<()> {
            let mut profiles = self.inner.profiles.write().unwrap();
            let profile = profiles
                .entry(user_id.to_string())
                .or_insert_with(|| BillingProfile::new(user_id));
            profile.customer_id = Some(customer_id.to_string());
            Ok(())
        }

        async fn apply_subscription_update(
            &self,
            user_id: &str,
            update: &SubscriptionUpdate,
        ) -> Result<()> {
            let mut profiles = self.inner.profiles.write().unwrap();
            let profile = profiles
                .entry(user_id.to_string())
                .or_insert_with(|| BillingProfile::new(user_id));
            profile.plan_id = update.plan_id.map(|p| p.as_str().to_string());
            profile.status = Some(update.status.as_str().to_string());
            profile.subscription_id = update.subscription_id.clone();
            profile.customer_id = Some(update.customer_id.clone());
            Ok(())
        }

        async fn set_subscription_status(
            &self,
            user_id: &str,
            status: SubscriptionStatus,
        ) -> Result<()> {
            let mut profiles = self.inner.profiles.write().unwrap();
            if let Some(profile) = profiles.get_mut(user_id) {
                profile.status = Some(status.as_str().to_string());
            }
            Ok(())
        }

        async fn claim_event(&self, event_id: &str, event_type: &str) -> Result<EventClaim> {
            let mut events = self.inner.claimed_events.write().unwrap();
            if events.contains_key(event_id) {
                return Ok(EventClaim::Duplicate);
            }
            events.insert(
                event_id.to_string(),
                ClaimedEvent {
                    event_type: event_type.to_string(),
                    claimed_at: current_timestamp(),
                },
            );
            Ok(EventClaim::New)
        }

        async fn release_event(&self, event_id: &str) -> Result<()> {
            self.inner.claimed_events.write().unwrap().remove(event_id);
            Ok(())
        }

        async fn cleanup_expired_events(&self, retention: Duration) -> Result<usize> {
            let cutoff = current_timestamp().saturating_sub(retention.as_secs());
            let mut events = self.inner.claimed_events.write().unwrap();
            let before = events.len();
            events.retain(|_, event| event.claimed_at > cutoff);
            Ok(before - events.len())
        }
    }

}
