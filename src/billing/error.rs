//! Billing-specific error types.
//!
//! Provides granular error types for billing operations, enabling better
//! error handling and more informative error messages for API consumers.

use super::plans::{FeatureKey, PlanId};
use std::fmt;

/// Billing-specific errors.
///
/// These errors provide more context than generic errors and can be
/// converted to `ExecutryError` for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    // Entitlement errors
    /// The operation requires a plan the user does not have.
    EntitlementRequired {
        required_plan: PlanId,
        feature: Option<FeatureKey>,
    },

    // Customer errors
    /// No payment-provider customer is linked to the user.
    NoCustomer { user_id: String },
    /// No billing profile exists for the user.
    ProfileNotFound { user_id: String },
    /// The provider reports the linked customer no longer exists.
    CustomerGone { customer_id: String },

    // Webhook errors
    /// Webhook signature is invalid.
    InvalidWebhookSignature,
    /// Webhook timestamp is too old (replay attack protection).
    WebhookTimestampExpired { age_seconds: i64 },
    /// Webhook event data is malformed.
    InvalidWebhookPayload { message: String },

    // Provider API errors
    /// The payment provider returned an error.
    ProviderApi {
        operation: String,
        message: String,
        http_status: Option<u16>,
    },

    // Rate limiting
    /// Too many billing portal requests from this user.
    PortalRateLimited { user_id: String },

    // General errors
    /// The operation failed after the re-provision retry.
    RetryExhausted { operation: String },
    /// An unexpected internal error occurred.
    Internal { message: String },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntitlementRequired { required_plan, feature } => {
                write!(f, "Requires the '{}' plan", required_plan)?;
                if let Some(feature) = feature {
                    write!(f, " (feature: {})", feature)?;
                }
                Ok(())
            }
            Self::NoCustomer { user_id } => {
                write!(f, "No payment customer linked for '{}'", user_id)
            }
            Self::ProfileNotFound { user_id } => {
                write!(f, "No billing profile for '{}'", user_id)
            }
            Self::CustomerGone { customer_id } => {
                write!(f, "Payment customer no longer exists: {}", customer_id)
            }
            Self::InvalidWebhookSignature => {
                write!(f, "Invalid webhook signature")
            }
            Self::WebhookTimestampExpired { age_seconds } => {
                write!(f, "Webhook timestamp expired ({} seconds old)", age_seconds)
            }
            Self::InvalidWebhookPayload { message } => {
                write!(f, "Invalid webhook payload: {}", message)
            }
            Self::ProviderApi { operation, message, http_status } => {
                write!(f, "Payment provider error during '{}': {}", operation, message)?;
                if let Some(status) = http_status {
                    write!(f, " [HTTP {}]", status)?;
                }
                Ok(())
            }
            Self::PortalRateLimited { user_id } => {
                write!(f, "Too many billing portal requests for '{}'", user_id)
            }
            Self::RetryExhausted { operation } => {
                write!(f, "Operation '{}' failed after customer re-provisioning", operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal billing error: {}", message)
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl From<BillingError> for crate::error::ExecutryError {
    fn from(err: BillingError) -> Self {
        match &err {
            // Map to PaymentRequired
            BillingError::EntitlementRequired { .. } => {
                crate::error::ExecutryError::PaymentRequired(err.to_string())
            }

            // Map to NotFound
            BillingError::NoCustomer { .. } | BillingError::ProfileNotFound { .. } => {
                crate::error::ExecutryError::NotFound(err.to_string())
            }

            // Map to BadRequest (client errors)
            BillingError::InvalidWebhookSignature
            | BillingError::WebhookTimestampExpired { .. }
            | BillingError::InvalidWebhookPayload { .. } => {
                crate::error::ExecutryError::BadRequest(err.to_string())
            }

            // Map to TooManyRequests
            BillingError::PortalRateLimited { .. } => {
                crate::error::ExecutryError::TooManyRequests(err.to_string())
            }

            // Map to Internal (server errors)
            BillingError::CustomerGone { .. }
            | BillingError::RetryExhausted { .. }
            | BillingError::Internal { .. } => {
                crate::error::ExecutryError::Internal(err.to_string())
            }

            // Map provider API errors based on HTTP status
            BillingError::ProviderApi { http_status, .. } => match http_status {
                Some(400..=499) => crate::error::ExecutryError::BadRequest(err.to_string()),
                _ => crate::error::ExecutryError::Internal(err.to_string()),
            },
        }
    }
}

impl BillingError {
    /// Create an entitlement error for a missing plan.
    #[must_use]
    pub fn requires_plan(required_plan: PlanId) -> Self {
        Self::EntitlementRequired {
            required_plan,
            feature: None,
        }
    }

    /// Create an entitlement error for a missing feature.
    #[must_use]
    pub fn requires_feature(required_plan: PlanId, feature: FeatureKey) -> Self {
        Self::EntitlementRequired {
            required_plan,
            feature: Some(feature),
        }
    }

    /// Check if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::EntitlementRequired { .. }
            | Self::NoCustomer { .. }
            | Self::ProfileNotFound { .. }
            | Self::InvalidWebhookSignature
            | Self::WebhookTimestampExpired { .. }
            | Self::InvalidWebhookPayload { .. }
            | Self::PortalRateLimited { .. } => true,
            Self::ProviderApi { http_status, .. } => {
                matches!(http_status, Some(400..=499))
            }
            _ => false,
        }
    }

    /// Check if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::CustomerGone { .. } | Self::RetryExhausted { .. } | Self::Internal { .. } => true,
            Self::ProviderApi { http_status, .. } => {
                matches!(http_status, Some(500..=599) | None)
            }
            _ => false,
        }
    }

    /// Check if the failed operation is worth retrying.
    ///
    /// Webhook endpoints use this to decide between acknowledging an event
    /// (stop provider redelivery) and failing it (provider will redeliver).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CustomerGone { .. } => true,
            Self::ProviderApi { http_status, .. } => {
                // Rate limit (429) and server errors (5xx) are retryable
                matches!(http_status, Some(429) | Some(500..=599) | None)
            }
            _ => false,
        }
    }
}
