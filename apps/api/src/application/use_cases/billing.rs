use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::billing_gateway::{
            BillingGateway, CheckoutSessionObject, InvoiceObject, SubscriptionObject, WebhookEvent,
            timestamp_to_naive,
        },
        use_cases::user::{UserProfile, UserRepo},
    },
    domain::entities::{PlanTier, subscription::SubscriptionStatus},
};

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<NaiveDateTime>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Fields written when a subscription is created or refreshed from the provider.
#[derive(Debug, Clone)]
pub struct SubscriptionUpsert {
    pub user_id: Uuid,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<NaiveDateTime>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleProfile {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub stripe_invoice_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: Option<Uuid>,
    pub stripe_invoice_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesTotals {
    pub count: i64,
    pub amount_cents: i64,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionProfile>>;
    async fn get_by_customer(&self, customer_id: &str) -> AppResult<Option<SubscriptionProfile>>;
    /// Insert or replace the single subscription row keyed on `user_id`.
    async fn upsert(&self, input: &SubscriptionUpsert) -> AppResult<SubscriptionProfile>;
    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<SubscriptionProfile>;
    async fn count_active(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait SaleRepo: Send + Sync {
    /// Returns false when a sale for the invoice is already recorded.
    async fn insert(&self, sale: &NewSale) -> AppResult<bool>;
    async fn totals(&self) -> AppResult<SalesTotals>;
}

#[async_trait]
pub trait WebhookEventRepo: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool>;
    async fn mark_processed(&self, event_id: &str, event_type: &str) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    Ignored,
}

#[derive(Clone)]
pub struct BillingUseCases {
    users: Arc<dyn UserRepo>,
    subscriptions: Arc<dyn SubscriptionRepo>,
    sales: Arc<dyn SaleRepo>,
    events: Arc<dyn WebhookEventRepo>,
    gateway: Arc<dyn BillingGateway>,
    pro_price_id: String,
    app_origin: String,
}

impl BillingUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        subscriptions: Arc<dyn SubscriptionRepo>,
        sales: Arc<dyn SaleRepo>,
        events: Arc<dyn WebhookEventRepo>,
        gateway: Arc<dyn BillingGateway>,
        pro_price_id: String,
        app_origin: String,
    ) -> Self {
        Self {
            users,
            subscriptions,
            sales,
            events,
            gateway,
            pro_price_id,
            app_origin: app_origin.trim_end_matches('/').to_string(),
        }
    }

    /// Start a pro subscription checkout. Returns the hosted checkout URL.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_checkout(&self, user: &UserProfile) -> AppResult<String> {
        let existing = self.subscriptions.get_by_user(user.id).await?;
        let already_pro = user.plan == PlanTier::Pro
            || existing.as_ref().is_some_and(|s| s.status.grants_pro());
        if already_pro {
            return Err(AppError::InvalidInput(
                "You already have an active pro subscription".into(),
            ));
        }

        let customer_id = match existing {
            Some(sub) => sub.stripe_customer_id,
            None => {
                self.gateway
                    .get_or_create_customer(&user.email, user.id)
                    .await?
            }
        };

        let success_url = format!("{}/dashboard/billing?checkout=success", self.app_origin);
        let cancel_url = format!("{}/dashboard/billing?checkout=canceled", self.app_origin);
        let session = self
            .gateway
            .create_checkout_session(
                &customer_id,
                &self.pro_price_id,
                user.id,
                &success_url,
                &cancel_url,
            )
            .await?;

        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(session.url)
    }

    /// Open the provider's self-service portal. Returns the portal URL.
    #[instrument(skip(self))]
    pub async fn create_portal(&self, user_id: Uuid) -> AppResult<String> {
        let subscription = self
            .subscriptions
            .get_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let return_url = format!("{}/dashboard/billing", self.app_origin);
        let session = self
            .gateway
            .create_portal_session(&subscription.stripe_customer_id, &return_url)
            .await?;
        Ok(session.url)
    }

    #[instrument(skip(self))]
    pub async fn get_subscription(&self, user_id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        self.subscriptions.get_by_user(user_id).await
    }

    /// Apply a verified webhook event. Events are applied at most once.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn process_webhook_event(&self, event: &WebhookEvent) -> AppResult<WebhookOutcome> {
        if self.events.is_processed(&event.id).await? {
            tracing::debug!("Webhook event already processed");
            return Ok(WebhookOutcome::Duplicate);
        }

        let outcome = match event.event_type.as_str() {
            "checkout.session.completed" => {
                self.apply_checkout_completed(event).await?;
                WebhookOutcome::Processed
            }
            "customer.subscription.created"
            | "customer.subscription.updated"
            | "customer.subscription.deleted" => {
                self.apply_subscription_change(event).await?;
                WebhookOutcome::Processed
            }
            "invoice.payment_succeeded" | "invoice.paid" => {
                self.record_sale(event).await?;
                WebhookOutcome::Processed
            }
            "invoice.payment_failed" => {
                self.apply_payment_failed(event).await?;
                WebhookOutcome::Processed
            }
            _ => {
                tracing::debug!("Ignoring unhandled webhook event type");
                WebhookOutcome::Ignored
            }
        };

        self.events
            .mark_processed(&event.id, &event.event_type)
            .await?;
        Ok(outcome)
    }

    async fn apply_checkout_completed(&self, event: &WebhookEvent) -> AppResult<()> {
        let session: CheckoutSessionObject = event
            .object()
            .ok_or_else(|| AppError::InvalidInput("Malformed checkout session".into()))?;

        let user_id = session
            .client_reference_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| {
                AppError::InvalidInput("Checkout session has no client_reference_id".into())
            })?;
        let subscription_id = session
            .subscription
            .ok_or_else(|| AppError::InvalidInput("Checkout session has no subscription".into()))?;

        let remote = self.gateway.get_subscription(&subscription_id).await?;
        let customer_id = session.customer.unwrap_or(remote.customer_id);

        let stored = self
            .subscriptions
            .upsert(&SubscriptionUpsert {
                user_id,
                stripe_customer_id: customer_id,
                stripe_subscription_id: Some(remote.id),
                stripe_price_id: remote.price_id,
                status: remote.status,
                current_period_start: remote.current_period_start,
                current_period_end: remote.current_period_end,
                cancel_at_period_end: remote.cancel_at_period_end,
            })
            .await?;

        self.users.set_plan(user_id, stored.status.plan()).await?;
        tracing::info!(%user_id, status = %stored.status, "Subscription activated from checkout");
        Ok(())
    }

    async fn apply_subscription_change(&self, event: &WebhookEvent) -> AppResult<()> {
        let remote: SubscriptionObject = event
            .object()
            .ok_or_else(|| AppError::InvalidInput("Malformed subscription object".into()))?;

        let existing = self
            .subscriptions
            .get_by_customer(&remote.customer)
            .await?
            .ok_or(AppError::NotFound)?;

        // A customer keeps its id across resubscriptions; events for a replaced
        // subscription must not touch the current one.
        if let Some(current_id) = existing.stripe_subscription_id.as_deref() {
            if current_id != remote.id {
                tracing::info!(
                    user_id = %existing.user_id,
                    current_subscription = current_id,
                    event_subscription = %remote.id,
                    "Skipping event for a replaced subscription"
                );
                return Ok(());
            }
        }

        let status = if event.event_type == "customer.subscription.deleted" {
            SubscriptionStatus::Canceled
        } else {
            SubscriptionStatus::from_stripe(&remote.status)
        };

        let stored = self
            .subscriptions
            .upsert(&SubscriptionUpsert {
                user_id: existing.user_id,
                stripe_customer_id: existing.stripe_customer_id,
                stripe_subscription_id: Some(remote.id),
                stripe_price_id: existing.stripe_price_id,
                status,
                current_period_start: remote
                    .current_period_start
                    .and_then(timestamp_to_naive)
                    .or(existing.current_period_start),
                current_period_end: remote
                    .current_period_end
                    .and_then(timestamp_to_naive)
                    .or(existing.current_period_end),
                cancel_at_period_end: remote.cancel_at_period_end,
            })
            .await?;

        self.users
            .set_plan(stored.user_id, stored.status.plan())
            .await?;
        tracing::info!(user_id = %stored.user_id, status = %stored.status, "Subscription updated");
        Ok(())
    }

    async fn record_sale(&self, event: &WebhookEvent) -> AppResult<()> {
        let invoice: InvoiceObject = event
            .object()
            .ok_or_else(|| AppError::InvalidInput("Malformed invoice object".into()))?;

        let user_id = match invoice.customer.as_deref() {
            Some(customer) => self
                .subscriptions
                .get_by_customer(customer)
                .await?
                .map(|s| s.user_id),
            None => None,
        };
        if user_id.is_none() {
            tracing::warn!(invoice_id = %invoice.id, "Recording sale for unknown customer");
        }

        let inserted = self
            .sales
            .insert(&NewSale {
                user_id,
                stripe_invoice_id: invoice.id,
                stripe_customer_id: invoice.customer,
                stripe_subscription_id: invoice.subscription,
                amount_cents: invoice.amount_paid,
                currency: invoice.currency,
            })
            .await?;
        if !inserted {
            tracing::debug!("Sale already recorded for invoice");
        }
        Ok(())
    }

    async fn apply_payment_failed(&self, event: &WebhookEvent) -> AppResult<()> {
        let invoice: InvoiceObject = event
            .object()
            .ok_or_else(|| AppError::InvalidInput("Malformed invoice object".into()))?;
        let customer = invoice
            .customer
            .ok_or_else(|| AppError::InvalidInput("Invoice has no customer".into()))?;

        let existing = self
            .subscriptions
            .get_by_customer(&customer)
            .await?
            .ok_or(AppError::NotFound)?;
        self.subscriptions
            .set_status(existing.id, SubscriptionStatus::PastDue)
            .await?;
        tracing::warn!(user_id = %existing.user_id, "Subscription payment failed");
        Ok(())
    }
}
