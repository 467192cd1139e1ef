use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_gateway::{
        BillingGateway, CheckoutSession, GatewaySubscription, PortalSession, timestamp_to_naive,
    },
    domain::entities::subscription::SubscriptionStatus,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a signed webhook delivery, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<StripeCustomer> {
        let params: Vec<(&str, String)> = vec![
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/customers", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    pub async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<StripeCustomer>> {
        let response = self
            .client
            .get(format!("{}/customers", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        let list: StripeCustomerList = self.handle_response(response).await?;
        Ok(list.data.into_iter().next())
    }

    // ========================================================================
    // Checkout Sessions
    // ========================================================================

    pub async fn create_subscription_checkout(
        &self,
        customer_id: &str,
        price_id: &str,
        client_reference_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<StripeCheckoutSession> {
        let params: Vec<(&str, &str)> = vec![
            ("customer", customer_id),
            ("mode", "subscription"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("client_reference_id", client_reference_id),
            ("subscription_data[metadata][user_id]", client_reference_id),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Customer Portal
    // ========================================================================

    pub async fn create_billing_portal(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<StripePortalSession> {
        let params = vec![("customer", customer_id), ("return_url", return_url)];

        let response = self
            .client
            .post(format!("{}/billing_portal/sessions", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> AppResult<StripeSubscription> {
        let response = self
            .client
            .get(format!("{}/subscriptions/{}", STRIPE_API_BASE, subscription_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Webhook Signature Verification
    // ========================================================================

    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &SecretString,
    ) -> AppResult<()> {
        Self::verify_webhook_signature_at(
            payload,
            signature_header,
            webhook_secret.expose_secret(),
            chrono::Utc::now().timestamp(),
            WEBHOOK_TOLERANCE_SECS,
        )
    }

    /// Verify a `Stripe-Signature` header ("t=timestamp,v1=signature,...")
    /// against an explicit clock.
    pub fn verify_webhook_signature_at(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
        now: i64,
        tolerance_secs: i64,
    ) -> AppResult<()> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| AppError::InvalidInput("Missing timestamp in signature".into()))?;

        if signatures.is_empty() {
            return Err(AppError::InvalidInput("Missing signature".into()));
        }

        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !signatures.iter().any(|sig| constant_time_compare(sig, &expected)) {
            return Err(AppError::InvalidInput("Invalid signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid timestamp".into()))?;
        if (now - ts).abs() > tolerance_secs {
            return Err(AppError::InvalidInput("Timestamp too old".into()));
        }

        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                if status.is_client_error() {
                    return Err(AppError::InvalidInput(format!(
                        "Stripe error: {}",
                        error.error.message.unwrap_or(error.error.error_type)
                    )));
                }
            }

            return Err(AppError::Internal(format!(
                "Stripe API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Internal(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[async_trait]
impl BillingGateway for StripeClient {
    async fn get_or_create_customer(&self, email: &str, user_id: Uuid) -> AppResult<String> {
        if let Some(customer) = self.find_customer_by_email(email).await? {
            return Ok(customer.id);
        }
        let customer = self.create_customer(email, user_id).await?;
        tracing::info!(customer_id = %customer.id, %user_id, "Created Stripe customer");
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        client_reference_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        let session = self
            .create_subscription_checkout(
                customer_id,
                price_id,
                &client_reference_id.to_string(),
                success_url,
                cancel_url,
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| AppError::Internal("Checkout session has no URL".into()))?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        let session = self.create_billing_portal(customer_id, return_url).await?;
        Ok(PortalSession { url: session.url })
    }

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription> {
        let sub = self.retrieve_subscription(subscription_id).await?;
        Ok(GatewaySubscription::from(sub))
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomerList {
    pub data: Vec<StripeCustomer>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripePortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub items: StripeSubscriptionItems,
}

impl StripeSubscription {
    /// First price id among the subscription items.
    pub fn price_id(&self) -> Option<String> {
        self.items.data.first().map(|item| item.price.id.clone())
    }
}

impl From<StripeSubscription> for GatewaySubscription {
    fn from(sub: StripeSubscription) -> Self {
        let price_id = sub.price_id();
        Self {
            status: SubscriptionStatus::from_stripe(&sub.status),
            current_period_start: sub.current_period_start.and_then(timestamp_to_naive),
            current_period_end: sub.current_period_end.and_then(timestamp_to_naive),
            cancel_at_period_end: sub.cancel_at_period_end,
            price_id,
            id: sub.id,
            customer_id: sub.customer,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
}
