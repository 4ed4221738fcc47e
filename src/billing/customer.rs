//! Customer provisioning for the payment provider.
//!
//! Handles creating provider customers and linking them to users.

use super::error::BillingError;
use super::storage::BillingStore;
use crate::error::Result;
use async_trait::async_trait;

/// Customer provisioning operations.
///
/// Creates payment-provider customers and records the linkage on the
/// user's billing profile.
pub struct CustomerManager<S: BillingStore, C: PaymentClient> {
    store: S,
    client: C,
}

impl<S: BillingStore, C: PaymentClient> CustomerManager<S, C> {
    /// Create a new customer manager.
    #[must_use]
    pub fn new(store: S, client: C) -> Self {
        Self { store, client }
    }

    /// Get the provider customer id for a user, creating one if needed.
    ///
    /// Checks for an existing linkage first; otherwise provisions a new
    /// provider customer and links it.
    pub async fn get_or_create_customer(&self, user_id: &str) -> Result<String> {
        if let Some(profile) = self.store.get_profile(user_id).await? {
            if let Some(customer_id) = profile.customer_id {
                return Ok(customer_id);
            }
        }

        self.provision_customer(user_id).await
    }

    /// Provision a replacement provider customer for a user.
    ///
    /// Used when the provider reports the linked customer as gone, which
    /// happens when a customer is deleted in the provider dashboard while
    /// our linkage still points at it. Always creates a fresh customer and
    /// overwrites the stale linkage.
    pub async fn reprovision_customer(&self, user_id: &str) -> Result<String> {
        tracing::info!(user_id = %user_id, "provisioning replacement customer");
        self.provision_customer(user_id).await
    }

    /// Get the provider customer id for a user (without creating).
    pub async fn get_customer_id(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .and_then(|p| p.customer_id))
    }

    /// Link an existing provider customer to a user.
    pub async fn link_customer(&self, user_id: &str, customer_id: &str) -> Result<()> {
        self.store.set_customer_id(user_id, customer_id).await
    }

    async fn provision_customer(&self, user_id: &str) -> Result<String> {
        let email = self
            .store
            .get_profile(user_id)
            .await?
            .and_then(|p| p.email);

        let customer_id = self
            .client
            .create_customer(CreateCustomerRequest {
                email,
                user_id: user_id.to_string(),
            })
            .await?;

        self.store.set_customer_id(user_id, &customer_id).await?;

        tracing::info!(
            user_id = %user_id,
            customer_id = %customer_id,
            "provider customer linked"
        );

        Ok(customer_id)
    }
}

/// Request to create a provider customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    /// Billing email, when the profile has one.
    pub email: Option<String>,
    /// The user to record in customer metadata.
    pub user_id: String,
}

/// Subscription state as reported by the payment provider.
///
/// `status` is the provider's raw status string; it is normalized through
/// [`SubscriptionStatus::from_provider`](super::plans::SubscriptionStatus::from_provider)
/// before being written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    /// Provider subscription id.
    pub subscription_id: String,
    /// Provider customer id.
    pub customer_id: String,
    /// Raw provider status string.
    pub status: String,
    /// Price id of the subscription's first item.
    pub price_id: Option<String>,
}

/// Trait for payment-provider customer operations.
///
/// This abstraction allows testing without real provider calls. Errors are
/// typed so callers can distinguish a vanished customer
/// ([`BillingError::CustomerGone`]) from other API failures.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Create a new customer at the provider.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> std::result::Result<String, BillingError>;

    /// Fetch the active subscription for a customer, if any.
    ///
    /// Returns [`BillingError::CustomerGone`] when the provider no longer
    /// knows the customer id.
    async fn get_customer_subscription(
        &self,
        customer_id: &str,
    ) -> std::result::Result<Option<ProviderSubscription>, BillingError>;
}

/// Mock payment client for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    /// Mock payment client for testing.
    ///
    /// Wraps state in Arc so clones observe the same provider-side data.
    /// Customers removed with [`remove_customer`](Self::remove_customer)
    /// make subscription lookups fail with `CustomerGone`, simulating a
    /// customer deleted in the provider dashboard.
    #[derive(Default, Clone)]
    pub struct MockPaymentClient {
        inner: Arc<MockPaymentClientInner>,
    }

    #[derive(Default)]
    struct MockPaymentClientInner {
        customer_counter: AtomicU64,
        customers: RwLock<HashMap<String, MockCustomer>>,
        subscriptions: RwLock<HashMap<String, ProviderSubscription>>,
        fail_subscription_lookups: AtomicBool,
    }

    #[derive(Clone)]
    struct MockCustomer {
        #[allow(dead_code)]
        email: Option<String>,
        #[allow(dead_code)]
        user_id: Option<String>,
    }

    impl MockPaymentClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a customer as existing on the provider side.
        pub fn seed_customer(&self, customer_id: &str) {
            self.inner.customers.write().unwrap().insert(
                customer_id.to_string(),
                MockCustomer {
                    email: None,
                    user_id: None,
                },
            );
        }

        /// Delete a customer on the provider side.
        ///
        /// Subsequent subscription lookups for this id return `CustomerGone`.
        pub fn remove_customer(&self, customer_id: &str) {
            self.inner.customers.write().unwrap().remove(customer_id);
            self.inner
                .subscriptions
                .write()
                .unwrap()
                .remove(customer_id);
        }

        /// Attach a subscription to a customer.
        pub fn seed_subscription(&self, subscription: ProviderSubscription) {
            self.seed_customer(&subscription.customer_id);
            self.inner
                .subscriptions
                .write()
                .unwrap()
                .insert(subscription.customer_id.clone(), subscription);
        }

        /// Make every subscription lookup fail with `CustomerGone`.
        pub fn fail_subscription_lookups(&self, fail: bool) {
            self.inner
                .fail_subscription_lookups
                .store(fail, Ordering::SeqCst);
        }

        /// How many customers `create_customer` has provisioned.
        pub fn created_customer_count(&self) -> u64 {
            self.inner.customer_counter.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentClient for MockPaymentClient {
        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> std::result::Result<String, BillingError> {
            let id = format!(
                "cus_test_{}",
                self.inner.customer_counter.fetch_add(1, Ordering::SeqCst)
            );
            self.inner.customers.write().unwrap().insert(
                id.clone(),
                MockCustomer {
                    email: request.email,
                    user_id: Some(request.user_id),
                },
            );
            Ok(id)
        }

        async fn get_customer_subscription(
            &self,
            customer_id: &str,
        ) -> std::result::Result<Option<ProviderSubscription>, BillingError> {
            if self.inner.fail_subscription_lookups.load(Ordering::SeqCst) {
                return Err(BillingError::CustomerGone {
                    customer_id: customer_id.to_string(),
                });
            }
            if !self.inner.customers.read().unwrap().contains_key(customer_id) {
                return Err(BillingError::CustomerGone {
                    customer_id: customer_id.to_string(),
                });
            }
            Ok(self
                .inner
                .subscriptions
                .read()
                .unwrap()
                .get(customer_id)
                .cloned())
        }
    }
}
