//! Payment-provider webhook handling.
//!
//! Handles webhook signature verification, duplicate-delivery claims, and
//! subscription state syncing.

use crate::error::Result;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::customer::{CustomerManager, PaymentClient, ProviderSubscription};
use super::error::BillingError;
use super::plans::{PlanCatalog, SubscriptionStatus};
use super::storage::{BillingStore, EventClaim, SubscriptionUpdate};

/// Event types the processor handles. Everything else is acknowledged
/// without claiming an id, so the event table only ever holds ids that had
/// side effects.
const ALLOWED_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
    "invoice.paid",
    "invoice.payment_failed",
];

/// Webhook processor for payment-provider events.
///
/// Handles signature verification, duplicate-delivery claims, and event
/// application.
///
/// The webhook secret is stored using [`SecretString`] to prevent accidental
/// exposure in logs or debug output.
pub struct WebhookProcessor<S: BillingStore, C: PaymentClient> {
    store: S,
    client: C,
    webhook_secret: SecretString,
    catalog: PlanCatalog,
}

impl<S: BillingStore + Clone, C: PaymentClient + Clone> WebhookProcessor<S, C> {
    /// Create a new webhook processor.
    ///
    /// The webhook secret is stored securely and won't be exposed in debug output.
    #[must_use]
    pub fn new(
        store: S,
        client: C,
        webhook_secret: impl Into<SecretString>,
        catalog: PlanCatalog,
    ) -> Self {
        Self {
            store,
            client,
            webhook_secret: webhook_secret.into(),
            catalog,
        }
    }

    /// Verify the webhook signature and parse the event.
    ///
    /// # Arguments
    /// * `payload` - The raw request body
    /// * `signature` - The signature header value
    ///
    /// # Errors
    /// Returns an error if signature verification fails or the payload is
    /// not valid JSON.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        // Parse the signature header
        let sig_parts = parse_signature_header(signature)?;

        // Check timestamp is recent (within 5 minutes) to limit replay
        let now = crate::utils::current_timestamp() as i64;
        let timestamp_diff = (now - sig_parts.timestamp).abs();
        if timestamp_diff > 300 {
            return Err(BillingError::WebhookTimestampExpired {
                age_seconds: timestamp_diff,
            }
            .into());
        }

        // Compute expected signature
        let signed_payload =
            format!("{}.{}", sig_parts.timestamp, String::from_utf8_lossy(payload));
        let expected_sig =
            compute_signature(self.webhook_secret.expose_secret(), signed_payload.as_bytes())?;

        // Verify signature matches (constant-time comparison)
        let expected_bytes = hex::decode(&expected_sig)
            .map_err(|_| crate::error::ExecutryError::Internal("Hex decode error".to_string()))?;
        let provided_bytes =
            hex::decode(&sig_parts.signature).map_err(|_| BillingError::InvalidWebhookSignature)?;

        if expected_bytes.ct_eq(&provided_bytes).unwrap_u8() != 1 {
            return Err(BillingError::InvalidWebhookSignature.into());
        }

        // Parse the JSON payload
        // Log detailed error internally but return generic message to prevent information leakage
        let event: WebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(
                target: "executry::billing::webhook",
                error = %e,
                "failed to parse webhook payload"
            );
            BillingError::InvalidWebhookPayload {
                message: "malformed JSON payload".to_string(),
            }
        })?;

        Ok(event)
    }

    /// Verify, parse, and process a raw webhook delivery.
    pub async fn process_payload(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        let event = self.verify_signature(payload, signature)?;
        self.process_event(event).await
    }

    /// Process a verified webhook event.
    ///
    /// The event id is claimed before any side effect runs. The claim is
    /// insert-first, so of any number of concurrent deliveries of the same
    /// id exactly one applies the event; the rest are acknowledged as
    /// duplicates. A failed application releases the claim so the
    /// provider's redelivery can try again.
    pub async fn process_event(&self, event: WebhookEvent) -> Result<WebhookOutcome> {
        if !ALLOWED_EVENTS.contains(&event.event_type.as_str()) {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "webhook event type not handled"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        match self.store.claim_event(&event.id, &event.event_type).await? {
            EventClaim::Duplicate => {
                tracing::debug!(event_id = %event.id, "duplicate webhook delivery acknowledged");
                return Ok(WebhookOutcome::Duplicate);
            }
            EventClaim::New => {}
        }

        match self.apply_event(&event).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let Err(release_err) = self.store.release_event(&event.id).await {
                    tracing::error!(
                        event_id = %event.id,
                        error = %release_err,
                        "failed to release event claim after processing error"
                    );
                }
                Err(err)
            }
        }
    }

    /// Route a claimed event to its handler.
    async fn apply_event(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        match event.event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(event).await,
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.handle_subscription_updated(event).await
            }
            "customer.subscription.deleted" => self.handle_subscription_deleted(event).await,
            "invoice.paid" => {
                self.handle_invoice_status(event, SubscriptionStatus::Active).await
            }
            "invoice.payment_failed" => {
                self.handle_invoice_status(event, SubscriptionStatus::PastDue).await
            }
            _ => Ok(WebhookOutcome::Ignored),
        }
    }

    /// Handle checkout.session.completed.
    ///
    /// Links the provider customer to the referenced user, then pulls the
    /// customer's subscription to write plan state back. When the provider
    /// reports the customer gone, a replacement customer is provisioned and
    /// the lookup retried once; a second failure is terminal for this
    /// delivery.
    async fn handle_checkout_completed(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let session = event.data.object.as_object().ok_or_else(|| {
            BillingError::InvalidWebhookPayload {
                message: "checkout session is not a JSON object".to_string(),
            }
        })?;

        let user_id = session
            .get("client_reference_id")
            .and_then(|v| v.as_str())
            .or_else(|| {
                session
                    .get("metadata")
                    .and_then(|m| m.get("user_id"))
                    .and_then(|v| v.as_str())
            });

        let Some(user_id) = user_id else {
            tracing::warn!(event_id = %event.id, "checkout session carries no user reference");
            return Ok(WebhookOutcome::Processed);
        };

        let Some(customer_id) = session.get("customer").and_then(|v| v.as_str()) else {
            tracing::warn!(event_id = %event.id, "checkout session carries no customer");
            return Ok(WebhookOutcome::Processed);
        };

        let customers = CustomerManager::new(self.store.clone(), self.client.clone());
        customers.link_customer(user_id, customer_id).await?;

        let subscription = match self.client.get_customer_subscription(customer_id).await {
            Ok(subscription) => subscription,
            Err(BillingError::CustomerGone { .. }) => {
                tracing::warn!(
                    customer_id = %customer_id,
                    user_id = %user_id,
                    "customer gone during checkout sync, reprovisioning"
                );
                let replacement = customers.reprovision_customer(user_id).await?;
                match self.client.get_customer_subscription(&replacement).await {
                    Ok(subscription) => subscription,
                    Err(err) => {
                        tracing::error!(
                            customer_id = %replacement,
                            error = %err,
                            "subscription lookup failed after reprovisioning"
                        );
                        return Err(BillingError::RetryExhausted {
                            operation: "checkout subscription sync".to_string(),
                        }
                        .into());
                    }
                }
            }
            Err(err) => return Err(err.into()),
        };

        let Some(subscription) = subscription else {
            // Checkout can complete before the provider attaches the
            // subscription; subscription.created carries the rest.
            tracing::debug!(user_id = %user_id, "checkout linked customer without subscription");
            return Ok(WebhookOutcome::Processed);
        };

        let update = self.subscription_update_from(&subscription);
        self.store.apply_subscription_update(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.subscription_id,
            "checkout completed and subscription synced"
        );

        Ok(WebhookOutcome::Processed)
    }

    /// Handle subscription created/updated events.
    async fn handle_subscription_updated(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let subscription = parse_subscription_object(&event.data.object)?;

        let Some(user_id) = self
            .store
            .find_user_by_customer(&subscription.customer_id)
            .await?
        else {
            tracing::warn!(
                customer_id = %subscription.customer_id,
                event_id = %event.id,
                "subscription event for unknown customer"
            );
            return Ok(WebhookOutcome::Processed);
        };

        let update = self.subscription_update_from(&subscription);
        self.store.apply_subscription_update(&user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.subscription_id,
            status = update.status.as_str(),
            "subscription state synced"
        );

        Ok(WebhookOutcome::Processed)
    }

    /// Handle subscription deleted events.
    async fn handle_subscription_deleted(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let customer_id = event
            .data
            .object
            .get("customer")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BillingError::InvalidWebhookPayload {
                message: "missing customer id".to_string(),
            })?;

        let Some(user_id) = self.store.find_user_by_customer(customer_id).await? else {
            tracing::warn!(
                customer_id = %customer_id,
                event_id = %event.id,
                "subscription deletion for unknown customer"
            );
            return Ok(WebhookOutcome::Processed);
        };

        let update = SubscriptionUpdate {
            plan_id: None,
            status: SubscriptionStatus::Canceled,
            subscription_id: None,
            customer_id: customer_id.to_string(),
        };
        self.store.apply_subscription_update(&user_id, &update).await?;

        tracing::info!(user_id = %user_id, "subscription canceled");

        Ok(WebhookOutcome::Processed)
    }

    /// Handle invoice.paid / invoice.payment_failed.
    ///
    /// Invoice events carry payment state but no plan information, so only
    /// the status is written.
    async fn handle_invoice_status(
        &self,
        event: &WebhookEvent,
        status: SubscriptionStatus,
    ) -> Result<WebhookOutcome> {
        let Some(customer_id) = event.data.object.get("customer").and_then(|v| v.as_str()) else {
            tracing::warn!(event_id = %event.id, "invoice event carries no customer");
            return Ok(WebhookOutcome::Processed);
        };

        let Some(user_id) = self.store.find_user_by_customer(customer_id).await? else {
            tracing::warn!(
                customer_id = %customer_id,
                event_id = %event.id,
                "invoice event for unknown customer"
            );
            return Ok(WebhookOutcome::Processed);
        };

        self.store.set_subscription_status(&user_id, status).await?;

        tracing::info!(
            user_id = %user_id,
            status = status.as_str(),
            "subscription status updated from invoice event"
        );

        Ok(WebhookOutcome::Processed)
    }

    /// Build the write-back from a provider subscription.
    fn subscription_update_from(&self, subscription: &ProviderSubscription) -> SubscriptionUpdate {
        let plan_id = subscription
            .price_id
            .as_deref()
            .and_then(|price| self.catalog.plan_for_price(price));

        if plan_id.is_none() {
            if let Some(price) = subscription.price_id.as_deref() {
                tracing::warn!(price_id = %price, "subscription price not in plan catalog");
            }
        }

        SubscriptionUpdate {
            plan_id,
            status: SubscriptionStatus::from_provider(&subscription.status),
            subscription_id: Some(subscription.subscription_id.clone()),
            customer_id: subscription.customer_id.clone(),
        }
    }
}

/// Parsed webhook event.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
    /// Timestamp when the event was created.
    pub created: u64,
}

/// Webhook event data.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEventData {
    /// The object that triggered the event.
    pub object: serde_json::Value,
}

/// Outcome of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event was claimed and its side effects applied.
    Processed,
    /// Event id was already claimed; side effects were skipped.
    Duplicate,
    /// Event type is not handled; nothing was claimed.
    Ignored,
}

/// Parsed signature header parts.
struct SignatureParts {
    timestamp: i64,
    signature: String,
}

/// Parse the signature header.
fn parse_signature_header(header: &str) -> std::result::Result<SignatureParts, BillingError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(BillingError::InvalidWebhookSignature);
        };

        match key.trim() {
            "t" => timestamp = value.parse().ok(),
            "v1" => signature = Some(value.to_string()),
            _ => {} // Ignore other versions
        }
    }

    Ok(SignatureParts {
        timestamp: timestamp.ok_or(BillingError::InvalidWebhookSignature)?,
        signature: signature.ok_or(BillingError::InvalidWebhookSignature)?,
    })
}

/// Compute HMAC-SHA256 signature.
fn compute_signature(secret: &str, payload: &[u8]) -> std::result::Result<String, BillingError> {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        BillingError::Internal {
            message: "HMAC key error".to_string(),
        }
    })?;

    mac.update(payload);
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Parse a subscription object from an event payload.
fn parse_subscription_object(
    object: &serde_json::Value,
) -> std::result::Result<ProviderSubscription, BillingError> {
    let obj = object
        .as_object()
        .ok_or_else(|| BillingError::InvalidWebhookPayload {
            message: "subscription is not a JSON object".to_string(),
        })?;

    let subscription_id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::InvalidWebhookPayload {
            message: "missing subscription id".to_string(),
        })?
        .to_string();

    let customer_id = obj
        .get("customer")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::InvalidWebhookPayload {
            message: "missing customer id".to_string(),
        })?
        .to_string();

    let status = obj
        .get("status")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::InvalidWebhookPayload {
            message: "missing subscription status".to_string(),
        })?
        .to_string();

    let price_id = obj
        .get("items")
        .and_then(|v| v.get("data"))
        .and_then(|v| v.as_array())
        .and_then(|items| items.first())
        .and_then(|item| item.get("price"))
        .and_then(|v| v.get("id"))
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(ProviderSubscription {
        subscription_id,
        customer_id,
        status,
        price_id,
    })
}
