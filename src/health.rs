use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::billing::{BillingError, PaymentClient};
use crate::estates::EstateStore;

/// Per-probe time budget. A check that exceeds it reports unhealthy instead
/// of stalling the endpoint.
const CHECK_TIMEOUT: Duration = Duration::from_millis(1500);

/// Customer id used to probe the payment provider. It never exists; a
/// definitive "no such customer" answer still proves the provider responds.
const PROBE_CUSTOMER_ID: &str = "cus_health_probe";

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// A passing result for a component.
    #[must_use]
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// A failing result for a component.
    #[must_use]
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status_code, Json(self)).into_response()
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>>;
}

/// Basic health check that always returns healthy
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicHealthCheck;

impl HealthCheck for BasicHealthCheck {
    fn name(&self) -> &str {
        "application"
    }

    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>> {
        Box::pin(async {
            ComponentHealth {
                name: self.name().to_string(),
                status: HealthStatus::Healthy,
                message: Some("application is running".to_string()),
            }
        })
    }
}

/// Health check that probes the estate store with a read round trip.
pub struct EstateStoreHealthCheck<S> {
    store: S,
}

impl<S> EstateStoreHealthCheck<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: EstateStore + 'static> HealthCheck for EstateStoreHealthCheck<S> {
    fn name(&self) -> &str {
        "database"
    }

    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>> {
        Box::pin(async {
            match self.store.get_estate("health-probe").await {
                Ok(_) => ComponentHealth::healthy(self.name()),
                Err(err) => {
                    tracing::warn!(error = %err, "estate store health probe failed");
                    ComponentHealth::unhealthy(self.name(), "store query failed")
                }
            }
        })
    }
}

/// Health check that probes the payment provider.
///
/// A "no such customer" response counts as healthy: the provider answered.
pub struct PaymentProviderHealthCheck<C> {
    client: C,
}

impl<C> PaymentProviderHealthCheck<C> {
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: PaymentClient + 'static> HealthCheck for PaymentProviderHealthCheck<C> {
    fn name(&self) -> &str {
        "payment_provider"
    }

    fn check(
        &self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>> {
        Box::pin(async {
            match self.client.get_customer_subscription(PROBE_CUSTOMER_ID).await {
                Ok(_) | Err(BillingError::CustomerGone { .. }) => {
                    ComponentHealth::healthy(self.name())
                }
                Err(err) => {
                    tracing::warn!(error = %err, "payment provider health probe failed");
                    ComponentHealth::unhealthy(self.name(), "provider unreachable")
                }
            }
        })
    }
}

/// Health check manager that runs all registered checks
pub struct HealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            checks: vec![Arc::new(BasicHealthCheck)],
        }
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Run every registered check, each bounded by the probe budget.
    pub async fn check_health(&self) -> HealthResponse {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        for check in &self.checks {
            let result = match tokio::time::timeout(CHECK_TIMEOUT, check.check()).await {
                Ok(result) => result,
                Err(_) => ComponentHealth::unhealthy(
                    check.name(),
                    format!("timed out after {}ms", CHECK_TIMEOUT.as_millis()),
                ),
            };

            match result.status {
                HealthStatus::Unhealthy => overall_status = HealthStatus::Unhealthy,
                HealthStatus::Degraded if overall_status == HealthStatus::Healthy => {
                    overall_status = HealthStatus::Degraded
                }
                _ => {}
            }

            checks.push(result);
        }

        HealthResponse {
            status: overall_status,
            checks,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for the health endpoint
pub async fn health_handler() -> HealthResponse {
    let checker = HealthChecker::new();
    checker.check_health().await
}

/// Creates the health check router
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Creates a health check router backed by a configured checker
pub fn health_routes_with(checker: Arc<HealthChecker>) -> Router {
    Router::new().route(
        "/health",
        get(move || async move { checker.check_health().await }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCheck;

    impl HealthCheck for FailingCheck {
        fn name(&self) -> &str {
            "failing"
        }

        fn check(
            &self,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>>
        {
            Box::pin(async { ComponentHealth::unhealthy(self.name(), "down") })
        }
    }

    struct StalledCheck;

    impl HealthCheck for StalledCheck {
        fn name(&self) -> &str {
            "stalled"
        }

        fn check(
            &self,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ComponentHealth> + Send + '_>>
        {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                ComponentHealth::healthy(self.name())
            })
        }
    }

    #[tokio::test]
    async fn test_unhealthy_component_fails_overall() {
        let checker = HealthChecker::new().with_check(Arc::new(FailingCheck));

        let response = checker.check_health().await;
        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(response.checks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_check_is_bounded() {
        let checker = HealthChecker::new().with_check(Arc::new(StalledCheck));

        let response = checker.check_health().await;
        assert_eq!(response.status, HealthStatus::Unhealthy);

        let stalled = response
            .checks
            .iter()
            .find(|c| c.name == "stalled")
            .unwrap();
        assert_eq!(stalled.status, HealthStatus::Unhealthy);
        assert!(stalled.message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_store_check_healthy() {
        use crate::estates::InMemoryEstateStore;

        let checker = HealthChecker::new()
            .with_check(Arc::new(EstateStoreHealthCheck::new(InMemoryEstateStore::new())));

        let response = checker.check_health().await;
        assert_eq!(response.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_provider_check_treats_missing_probe_customer_as_healthy() {
        use crate::billing::MockPaymentClient;

        let checker = HealthChecker::new()
            .with_check(Arc::new(PaymentProviderHealthCheck::new(MockPaymentClient::new())));

        let response = checker.check_health().await;
        assert_eq!(response.status, HealthStatus::Healthy);
    }
}
