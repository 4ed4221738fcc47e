//! Billing portal session management.
//!
//! Creates provider-hosted portal sessions for subscription self-service,
//! behind a per-user rate limit.

use super::error::BillingError;
use super::storage::BillingStore;
use crate::error::Result;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

/// Shrink the limiter state store every N requests to prevent unbounded
/// memory growth.
const SHRINK_INTERVAL: u64 = 1000;

/// Configuration for portal session rate limiting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortalRateLimitConfig {
    /// Maximum portal sessions per user per window.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,
    /// Time window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for PortalRateLimitConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            window_seconds: default_window_seconds(),
        }
    }
}

// Portal sessions are interactive; a handful per minute is plenty
fn default_max_sessions() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    60
}

/// Type alias for the keyed rate limiter
type KeyedLimiter =
    RateLimiter<String, DashMapStateStore<String>, DefaultClock, NoOpMiddleware>;

/// Billing portal session management.
///
/// Creates portal sessions for subscription self-service. Session creation
/// is rate limited per user. The limiter state is in-memory and best
/// effort: it resets on restart, and each instance of a multi-instance
/// deployment enforces the limit independently.
pub struct PortalManager<S: BillingStore, C: PortalClient> {
    store: S,
    client: C,
    limiter: Arc<KeyedLimiter>,
    config: PortalRateLimitConfig,
    request_count: Arc<AtomicU64>,
}

impl<S: BillingStore, C: PortalClient> PortalManager<S, C> {
    /// Create a new portal manager.
    pub fn new(store: S, client: C, config: PortalRateLimitConfig) -> Self {
        let max_sessions = NonZeroU32::new(config.max_sessions.max(1))
            .expect("max_sessions should be positive");
        let window = Duration::from_secs(config.window_seconds.max(1));

        let quota = Quota::with_period(window)
            .expect("window_seconds should be positive")
            .allow_burst(max_sessions);

        Self {
            store,
            client,
            limiter: Arc::new(RateLimiter::keyed(quota)),
            config,
            request_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a billing portal session for a user.
    ///
    /// Returns a portal session with a URL to redirect the user to. The
    /// user must already have a linked provider customer.
    pub async fn create_portal_session(
        &self,
        user_id: &str,
        return_url: &str,
    ) -> Result<PortalSession> {
        self.check_rate_limit(user_id)?;

        let customer_id = self
            .store
            .get_profile(user_id)
            .await?
            .and_then(|p| p.customer_id)
            .ok_or_else(|| BillingError::NoCustomer {
                user_id: user_id.to_string(),
            })?;

        let session = self
            .client
            .create_portal_session(CreatePortalSessionRequest {
                customer_id,
                return_url: return_url.to_string(),
            })
            .await?;

        tracing::info!(user_id = %user_id, "portal session created");

        Ok(session)
    }

    fn check_rate_limit(&self, user_id: &str) -> std::result::Result<(), BillingError> {
        // Periodically shrink the state store
        let count = self.request_count.fetch_add(1, Ordering::Relaxed);
        if count % SHRINK_INTERVAL == 0 && count > 0 {
            self.limiter.retain_recent();
        }

        if let Err(not_until) = self.limiter.check_key(&user_id.to_string()) {
            let wait = not_until
                .wait_time_from(governor::clock::Clock::now(&DefaultClock::default()));
            tracing::warn!(
                user_id = %user_id,
                retry_after_secs = wait.as_secs().max(1),
                max_sessions = self.config.max_sessions,
                window_secs = self.config.window_seconds,
                "portal session rate limited"
            );
            return Err(BillingError::PortalRateLimited {
                user_id: user_id.to_string(),
            });
        }

        Ok(())
    }
}

/// Portal session response.
#[derive(Debug, Clone)]
#[must_use]
pub struct PortalSession {
    /// Provider portal session ID.
    pub id: String,
    /// URL to redirect the user to.
    pub url: String,
}

/// Request to create a portal session.
#[derive(Debug, Clone)]
pub struct CreatePortalSessionRequest {
    /// Provider customer ID.
    pub customer_id: String,
    /// URL to return to after the portal.
    pub return_url: String,
}

/// Trait for provider portal operations.
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// Create a billing portal session.
    async fn create_portal_session(
        &self,
        request: CreatePortalSessionRequest,
    ) -> std::result::Result<PortalSession, BillingError>;
}

/// Mock portal client for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;

    /// Mock portal client.
    #[derive(Default)]
    pub struct MockPortalClient {
        session_counter: AtomicU64,
    }

    impl MockPortalClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PortalClient for MockPortalClient {
        async fn create_portal_session(
            &self,
            request: CreatePortalSessionRequest,
        ) -> std::result::Result<PortalSession, BillingError> {
            let id = format!(
                "bps_test_{}",
                self.session_counter.fetch_add(1, Ordering::SeqCst)
            );
            Ok(PortalSession {
                url: format!("https://portal.example.com/session/{id}?return={}", request.return_url),
                id,
            })
        }
    }
}
