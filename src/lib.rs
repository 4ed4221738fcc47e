//! Executry - estate administration with roles, billing, and entitlements
//!
//! Executry provides the account-level plumbing for a collaborative estate
//! administration service: per-estate role resolution, plan entitlements,
//! webhook-driven subscription sync, and health checks.
//!
//! # Features
//!
//! - **Access control**: per-estate role resolution with owner/editor/viewer capabilities
//! - **Estates**: trait-backed storage with quota enforcement and activity recording
//! - **Billing**: plan catalog, entitlement resolution, and customer linkage
//! - **Webhooks**: signature verification with insert-first idempotency
//! - **Portal**: rate-limited provider portal sessions
//! - **Health Checks**: bounded component probes behind an Axum endpoint
//! - **Testing**: in-memory stores and mock clients behind the `test-estates`
//!   and `test-billing` features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use executry::{self, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     executry::init_tracing();
//!
//!     // Load and validate configuration
//!     let config = ConfigBuilder::new().from_env().build().unwrap();
//!
//!     // Wire your stores and clients, then mount
//!     // executry::health::health_routes() on your router.
//!     let _ = config;
//! }
//! ```

pub mod access;
pub mod activity;
pub mod billing;
pub mod config;
pub mod error;
pub mod estates;
pub mod health;
pub mod invoices;
pub mod utils;

// Re-export commonly used types
pub use access::{resolve_access, AccessDecision, AccessResolver, EstateRole};
pub use activity::{ActivityEntry, ActivityEvent, ActivityStore};
pub use billing::{
    BillingError, BillingStore, Entitlements, EntitlementsManager, PaymentClient, PlanCatalog,
    PlanId, SubscriptionStatus, WebhookOutcome, WebhookProcessor,
};
pub use config::{BillingConfig, Config, ConfigBuilder, HealthConfig, LoggingConfig, ServerConfig};
pub use error::{ErrorResponse, ExecutryError, Result};
pub use estates::{Collaborator, Estate, EstateManager, EstateQuota, EstateStore};
pub use health::{ComponentHealth, HealthCheck, HealthChecker, HealthStatus};
pub use invoices::{Invoice, InvoiceStatus};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before wiring any managers.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "executry=debug")
/// - `EXECUTRY_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// use executry;
///
/// #[tokio::main]
/// async fn main() {
///     executry::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("EXECUTRY_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
