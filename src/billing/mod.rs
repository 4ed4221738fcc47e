//! Billing module for subscription-backed entitlements.
//!
//! Provides plan/status resolution, webhook-driven subscription syncing,
//! customer provisioning, and portal session creation.
//!
//! # Features
//!
//! - `test-billing` - Exposes the in-memory store and mock clients
//!
//! # Example
//!
//! ```rust,ignore
//! use executry::billing::{
//!     EntitlementsManager, PlanCatalog, PlanId, WebhookProcessor,
//! };
//!
//! // Map provider price ids to plans
//! let catalog = PlanCatalog::new()
//!     .with_price("price_pro_monthly", PlanId::Pro)
//!     .with_price("price_pro_yearly", PlanId::Pro);
//!
//! // Process webhook deliveries
//! let processor = WebhookProcessor::new(store.clone(), client, webhook_secret, catalog);
//! let outcome = processor.process_payload(&body, &signature_header).await?;
//!
//! // Gate pro functionality
//! let entitlements = EntitlementsManager::new(store);
//! entitlements.require_pro(&user_id).await?;
//! ```

pub mod customer;
pub mod entitlements;
pub mod error;
pub mod plans;
pub mod portal;
pub mod storage;
pub mod webhook;

// Plan exports
pub use plans::{FeatureKey, PlanCatalog, PlanFeatures, PlanId, PlanLimits, SubscriptionStatus};

// Storage exports
pub use storage::{BillingProfile, BillingStore, EventClaim, SubscriptionUpdate, EVENT_RETENTION};

// Entitlements exports
pub use entitlements::{
    resolve_entitlements, EntitlementQuota, Entitlements, EntitlementsManager, LimitCheckResult,
};

// Customer exports
pub use customer::{CreateCustomerRequest, CustomerManager, PaymentClient, ProviderSubscription};

// Webhook exports
pub use webhook::{WebhookEvent, WebhookEventData, WebhookOutcome, WebhookProcessor};

// Portal exports
pub use portal::{
    CreatePortalSessionRequest, PortalClient, PortalManager, PortalRateLimitConfig, PortalSession,
};

// Error exports
pub use error::BillingError;

// Test exports
#[cfg(any(test, feature = "test-billing"))]
pub use storage::test::InMemoryBillingStore;

#[cfg(any(test, feature = "test-billing"))]
pub use customer::test::MockPaymentClient;

#[cfg(any(test, feature = "test-billing"))]
pub use portal::test::MockPortalClient;
