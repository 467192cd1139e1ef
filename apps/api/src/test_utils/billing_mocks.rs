//! In-memory mock implementations for billing-related traits.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::billing_gateway::{
            BillingGateway, CheckoutSession, GatewaySubscription, PortalSession,
        },
        use_cases::billing::{
            NewSale, SaleProfile, SaleRepo, SalesTotals, SubscriptionProfile, SubscriptionRepo,
            SubscriptionUpsert, WebhookEventRepo,
        },
    },
    domain::entities::subscription::SubscriptionStatus,
};

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

/// Keyed by user id, mirroring the unique constraint on `subscriptions.user_id`.
#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, SubscriptionProfile>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<SubscriptionProfile>) -> Self {
        let map = subscriptions.into_iter().map(|s| (s.user_id, s)).collect();
        Self {
            subscriptions: Mutex::new(map),
        }
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self.subscriptions.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_by_customer(&self, customer_id: &str) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.stripe_customer_id == customer_id)
            .cloned())
    }

    async fn upsert(&self, input: &SubscriptionUpsert) -> AppResult<SubscriptionProfile> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let now = chrono::Utc::now().naive_utc();
        let (id, created_at) = subscriptions
            .get(&input.user_id)
            .map(|s| (s.id, s.created_at))
            .unwrap_or((Uuid::new_v4(), Some(now)));

        let profile = SubscriptionProfile {
            id,
            user_id: input.user_id,
            stripe_customer_id: input.stripe_customer_id.clone(),
            stripe_subscription_id: input.stripe_subscription_id.clone(),
            stripe_price_id: input.stripe_price_id.clone(),
            status: input.status,
            current_period_start: input.current_period_start,
            current_period_end: input.current_period_end,
            cancel_at_period_end: input.cancel_at_period_end,
            created_at,
            updated_at: Some(now),
        };
        subscriptions.insert(input.user_id, profile.clone());
        Ok(profile)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<SubscriptionProfile> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions
            .values_mut()
            .find(|s| s.id == id)
            .ok_or(AppError::NotFound)?;
        sub.status = status;
        sub.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(sub.clone())
    }

    async fn count_active(&self) -> AppResult<i64> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .count() as i64)
    }
}

// ============================================================================
// InMemorySaleRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySaleRepo {
    pub sales: Mutex<Vec<SaleProfile>>,
}

impl InMemorySaleRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_all(&self) -> Vec<SaleProfile> {
        self.sales.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaleRepo for InMemorySaleRepo {
    async fn insert(&self, sale: &NewSale) -> AppResult<bool> {
        let mut sales = self.sales.lock().unwrap();
        if sales
            .iter()
            .any(|s| s.stripe_invoice_id == sale.stripe_invoice_id)
        {
            return Ok(false);
        }
        sales.push(SaleProfile {
            id: Uuid::new_v4(),
            user_id: sale.user_id,
            stripe_invoice_id: sale.stripe_invoice_id.clone(),
            stripe_customer_id: sale.stripe_customer_id.clone(),
            stripe_subscription_id: sale.stripe_subscription_id.clone(),
            amount_cents: sale.amount_cents,
            currency: sale.currency.clone(),
            created_at: Some(chrono::Utc::now().naive_utc()),
        });
        Ok(true)
    }

    async fn totals(&self) -> AppResult<SalesTotals> {
        let sales = self.sales.lock().unwrap();
        Ok(SalesTotals {
            count: sales.len() as i64,
            amount_cents: sales.iter().map(|s| s.amount_cents).sum(),
        })
    }
}

// ============================================================================
// InMemoryWebhookEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryWebhookEventRepo {
    pub processed: Mutex<HashSet<String>>,
}

impl InMemoryWebhookEventRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepo for InMemoryWebhookEventRepo {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.processed.lock().unwrap().contains(event_id))
    }

    async fn mark_processed(&self, event_id: &str, _event_type: &str) -> AppResult<()> {
        self.processed.lock().unwrap().insert(event_id.to_string());
        Ok(())
    }
}

// ============================================================================
// StubBillingGateway
// ============================================================================

/// Arguments captured from a `create_checkout_session` call.
#[derive(Debug, Clone)]
pub struct CheckoutCall {
    pub customer_id: String,
    pub price_id: String,
    pub client_reference_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
}

/// Billing gateway that records calls and answers with canned sessions.
#[derive(Default)]
pub struct StubBillingGateway {
    checkout_calls: Mutex<Vec<CheckoutCall>>,
    subscription: Mutex<Option<GatewaySubscription>>,
}

impl StubBillingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkout_calls(&self) -> Vec<CheckoutCall> {
        self.checkout_calls.lock().unwrap().clone()
    }

    /// Subscription returned by `get_subscription` (any id).
    pub fn set_subscription(&self, subscription: GatewaySubscription) {
        *self.subscription.lock().unwrap() = Some(subscription);
    }
}

#[async_trait]
impl BillingGateway for StubBillingGateway {
    async fn get_or_create_customer(&self, _email: &str, user_id: Uuid) -> AppResult<String> {
        Ok(format!("cus_stub{}", user_id.simple()))
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        client_reference_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        self.checkout_calls.lock().unwrap().push(CheckoutCall {
            customer_id: customer_id.to_string(),
            price_id: price_id.to_string(),
            client_reference_id,
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
        });
        Ok(CheckoutSession {
            id: "cs_test_stub".to_string(),
            url: "https://checkout.stripe.test/cs_test_stub".to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_id: &str,
        _return_url: &str,
    ) -> AppResult<PortalSession> {
        Ok(PortalSession {
            url: "https://billing.stripe.test/portal".to_string(),
        })
    }

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription> {
        Ok(self
            .subscription
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| GatewaySubscription {
                id: subscription_id.to_string(),
                customer_id: "cus_stub".to_string(),
                status: SubscriptionStatus::Active,
                price_id: Some("price_test_pro".to_string()),
                current_period_start: None,
                current_period_end: None,
                cancel_at_period_end: false,
            }))
    }
}
