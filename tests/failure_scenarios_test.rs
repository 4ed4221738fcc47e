//! Error mapping and degraded-path behavior across the crate

use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use executry::billing::{
    BillingError, BillingProfile, CreateCustomerRequest, EntitlementsManager,
    InMemoryBillingStore, MockPortalClient, PaymentClient, PortalManager, PortalRateLimitConfig,
    ProviderSubscription,
};
use executry::estates::EstateError;
use executry::health::{HealthChecker, HealthStatus, PaymentProviderHealthCheck};
use executry::invoices::{Invoice, InvoiceStatus};
use executry::{ConfigBuilder, EstateRole, ExecutryError};

#[tokio::test]
async fn test_config_validation_failures() {
    // Invalid server address
    let result = ConfigBuilder::new()
        .with_host("invalid..host")
        .with_port(8000)
        .build();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Invalid server address"));

    // Invalid log level
    let result = ConfigBuilder::new().with_log_level("verbose").build();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Invalid log level"));

    // Broken portal rate limit
    let result = ConfigBuilder::new()
        .with_portal_rate_limit(PortalRateLimitConfig {
            max_sessions: 0,
            window_seconds: 60,
        })
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_estate_errors_map_to_http_statuses() {
    let err: ExecutryError = EstateError::not_found("est_1").into();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err: ExecutryError = EstateError::insufficient_role(EstateRole::Owner).into();
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

    let err: ExecutryError = EstateError::estate_limit_reached(1, 1).into();
    assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);

    let err: ExecutryError = EstateError::validation("estate name cannot be empty").into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_billing_errors_map_to_http_statuses() {
    let err: ExecutryError = BillingError::requires_plan(executry::PlanId::Pro).into();
    assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);

    let err: ExecutryError = BillingError::PortalRateLimited {
        user_id: "u1".to_string(),
    }
    .into();
    assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);

    let err: ExecutryError = BillingError::InvalidWebhookSignature.into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let err: ExecutryError = BillingError::RetryExhausted {
        operation: "checkout subscription sync".to_string(),
    }
    .into();
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_server_errors_hide_details_from_clients() {
    let err: ExecutryError = BillingError::RetryExhausted {
        operation: "checkout subscription sync".to_string(),
    }
    .into();
    let response = err.into_response();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["error"], "Internal server error");
    assert!(!json["error"].as_str().unwrap().contains("checkout"));
}

#[tokio::test]
async fn test_portal_rate_limit_exhaustion() {
    let store = InMemoryBillingStore::new();
    let mut profile = BillingProfile::new("u1");
    profile.customer_id = Some("cus_1".to_string());
    store.seed_profile(profile);
    let mut profile = BillingProfile::new("u2");
    profile.customer_id = Some("cus_2".to_string());
    store.seed_profile(profile);

    let manager = PortalManager::new(
        store,
        MockPortalClient::new(),
        PortalRateLimitConfig {
            max_sessions: 2,
            window_seconds: 60,
        },
    );

    manager
        .create_portal_session("u1", "https://app.example.com/billing")
        .await
        .unwrap();
    manager
        .create_portal_session("u1", "https://app.example.com/billing")
        .await
        .unwrap();

    let err = manager
        .create_portal_session("u1", "https://app.example.com/billing")
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutryError::TooManyRequests(_)));

    // The limit is per user
    manager
        .create_portal_session("u2", "https://app.example.com/billing")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_portal_requires_linked_customer() {
    let manager = PortalManager::new(
        InMemoryBillingStore::new(),
        MockPortalClient::new(),
        PortalRateLimitConfig::default(),
    );

    let err = manager
        .create_portal_session("u_nobody", "https://app.example.com/billing")
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutryError::NotFound(_)));
}

#[tokio::test]
async fn test_entitlement_gate_reports_payment_required() {
    let manager = EntitlementsManager::new(InMemoryBillingStore::new());

    let err = manager.require_pro("u_free").await.unwrap_err();
    assert!(matches!(err, ExecutryError::PaymentRequired(_)));
    assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_invoice_guards_reject_invalid_payments() {
    let mut invoice = Invoice::new("inv_1", "est_1", 10_000, "usd");

    // Payments against a draft are rejected and leave it untouched
    assert!(invoice.record_payment(4_000).is_err());
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.amount_paid, 0);

    invoice.mark_sent().unwrap();
    invoice.record_payment(4_000).unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Partial);

    // Overpayment is rejected without changing the balance
    assert!(invoice.record_payment(7_000).is_err());
    assert_eq!(invoice.amount_paid, 4_000);

    invoice.record_payment(6_000).unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.amount_remaining(), 0);

    // Paid invoices cannot be voided; the error maps to a client error
    let err = invoice.void().unwrap_err();
    let err: ExecutryError = err.into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

struct DownPaymentClient;

#[async_trait::async_trait]
impl PaymentClient for DownPaymentClient {
    async fn create_customer(
        &self,
        _request: CreateCustomerRequest,
    ) -> std::result::Result<String, BillingError> {
        Err(BillingError::ProviderApi {
            operation: "create_customer".to_string(),
            message: "connect timeout".to_string(),
            http_status: None,
        })
    }

    async fn get_customer_subscription(
        &self,
        _customer_id: &str,
    ) -> std::result::Result<Option<ProviderSubscription>, BillingError> {
        Err(BillingError::ProviderApi {
            operation: "get_customer_subscription".to_string(),
            message: "connect timeout".to_string(),
            http_status: None,
        })
    }
}

#[tokio::test]
async fn test_unreachable_provider_reports_unhealthy() {
    let checker = HealthChecker::new()
        .with_check(Arc::new(PaymentProviderHealthCheck::new(DownPaymentClient)));

    let response = checker.check_health().await;
    assert_eq!(response.status, HealthStatus::Unhealthy);

    let http = response.into_response();
    assert_eq!(http.status(), StatusCode::SERVICE_UNAVAILABLE);
}
