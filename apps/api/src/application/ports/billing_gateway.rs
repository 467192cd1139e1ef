use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::subscription::SubscriptionStatus};

// ============================================================================
// Port Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PortalSession {
    pub url: String,
}

/// Subscription state as reported by the billing provider.
#[derive(Debug, Clone)]
pub struct GatewaySubscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    pub current_period_start: Option<NaiveDateTime>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Outbound billing calls. Implemented by the Stripe REST client.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Find a customer by email, creating one if none exists. Returns the customer id.
    async fn get_or_create_customer(&self, email: &str, user_id: Uuid) -> AppResult<String>;

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        client_reference_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession>;

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription>;
}

// ============================================================================
// Webhook Payloads
// ============================================================================

/// Envelope of a verified billing webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn object<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.data.object.clone()).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub currency: String,
}

/// Convert a Unix timestamp to NaiveDateTime
pub fn timestamp_to_naive(secs: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}
