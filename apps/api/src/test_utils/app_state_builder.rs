//! Test app state builder for HTTP-level integration testing.
//!
//! This module provides `TestAppStateBuilder` which creates a complete `AppState`
//! backed by in-memory repositories and a stub billing gateway.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            admin::AdminUseCases, analytics::AnalyticsUseCases, billing::BillingUseCases,
            billing::SubscriptionProfile, models::ModelProfile, models::ModelUseCases,
            monitoring::MonitoringUseCases, monthly_data::MonthlyDataProfile,
            monthly_data::MonthlyDataUseCases, usage::UsageUseCases, user::UserProfile,
            user::UserUseCases,
        },
    },
    infra::{RateLimiterTrait, config::AppConfig},
    test_utils::{
        InMemoryModelRepo, InMemoryMonthlyDataRepo, InMemoryRateLimiter, InMemorySaleRepo,
        InMemorySubscriptionRepo, InMemoryUsageRepo, InMemoryUserRepo, InMemoryWebhookEventRepo,
        StubBillingGateway,
    },
};

pub const TEST_JWT_SECRET: &str = "test_supabase_secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_PRO_PRICE_ID: &str = "price_test_pro";
pub const TEST_APP_ORIGIN: &str = "http://localhost:3000";

/// Issue a valid access token for `user`, signed with the test secret.
pub fn test_token(user: &UserProfile) -> String {
    jwt::issue(
        user.id,
        &user.email,
        &SecretString::new(TEST_JWT_SECRET.into()),
        chrono::Duration::hours(1),
    )
    .unwrap()
}

/// `Authorization` header value for `user`.
pub fn bearer(user: &UserProfile) -> String {
    format!("Bearer {}", test_token(user))
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        db_max_connections: 1,
        run_migrations: false,
        supabase_jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        stripe_secret_key: SecretString::new("sk_test_unused".into()),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        stripe_pro_price_id: TEST_PRO_PRICE_ID.to_string(),
        app_origin: Url::parse(TEST_APP_ORIGIN).unwrap(),
        cors_origin: HeaderValue::from_static(TEST_APP_ORIGIN),
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        max_upload_bytes: 1024 * 1024,
        rate_limit_window_secs: 60,
    }
}

/// Handles to the in-memory repos behind a built `AppState`, for assertions.
pub struct TestMocks {
    pub users: Arc<InMemoryUserRepo>,
    pub models: Arc<InMemoryModelRepo>,
    pub monthly_data: Arc<InMemoryMonthlyDataRepo>,
    pub usage: Arc<InMemoryUsageRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub sales: Arc<InMemorySaleRepo>,
    pub webhook_events: Arc<InMemoryWebhookEventRepo>,
    pub gateway: Arc<StubBillingGateway>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user(|u| u.plan = PlanTier::Pro);
/// let model = create_test_model(user.id, |_| {});
///
/// let app_state = TestAppStateBuilder::new()
///     .with_user(user)
///     .with_model(model)
///     .build();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    users: Vec<UserProfile>,
    models: Vec<ModelProfile>,
    monthly_data: Vec<MonthlyDataProfile>,
    subscriptions: Vec<SubscriptionProfile>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
    config: Option<AppConfig>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_model(mut self, model: ModelProfile) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_monthly_data(mut self, row: MonthlyDataProfile) -> Self {
        self.monthly_data.push(row);
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionProfile) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Replace the default permissive limiter.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Replace the default `test_config()`.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Build the AppState and return the backing mocks alongside it.
    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let mocks = TestMocks {
            users: Arc::new(InMemoryUserRepo::with_users(self.users)),
            models: Arc::new(InMemoryModelRepo::with_models(self.models)),
            monthly_data: Arc::new(InMemoryMonthlyDataRepo::with_rows(self.monthly_data)),
            usage: Arc::new(InMemoryUsageRepo::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepo::with_subscriptions(
                self.subscriptions,
            )),
            sales: Arc::new(InMemorySaleRepo::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepo::new()),
            gateway: Arc::new(StubBillingGateway::new()),
        };

        let user_use_cases = UserUseCases::new(mocks.users.clone(), mocks.subscriptions.clone());
        let model_use_cases = ModelUseCases::new(mocks.models.clone());
        let monthly_data_use_cases = MonthlyDataUseCases::new(
            mocks.monthly_data.clone(),
            mocks.models.clone(),
            mocks.usage.clone(),
        );
        let analytics_use_cases =
            AnalyticsUseCases::new(mocks.monthly_data.clone(), mocks.models.clone());
        let usage_use_cases = Arc::new(UsageUseCases::new(
            mocks.usage.clone(),
            mocks.monthly_data.clone(),
            mocks.models.clone(),
        ));
        let monitoring_use_cases =
            MonitoringUseCases::new(usage_use_cases.clone(), mocks.subscriptions.clone());
        let billing_use_cases = BillingUseCases::new(
            mocks.users.clone(),
            mocks.subscriptions.clone(),
            mocks.sales.clone(),
            mocks.webhook_events.clone(),
            mocks.gateway.clone(),
            TEST_PRO_PRICE_ID.to_string(),
            TEST_APP_ORIGIN.to_string(),
        );
        let admin_use_cases = AdminUseCases::new(
            mocks.users.clone(),
            mocks.subscriptions.clone(),
            mocks.sales.clone(),
        );

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive()));

        let app_state = AppState {
            config: Arc::new(self.config.unwrap_or_else(test_config)),
            user_use_cases: Arc::new(user_use_cases),
            model_use_cases: Arc::new(model_use_cases),
            monthly_data_use_cases: Arc::new(monthly_data_use_cases),
            analytics_use_cases: Arc::new(analytics_use_cases),
            usage_use_cases,
            monitoring_use_cases: Arc::new(monitoring_use_cases),
            billing_use_cases: Arc::new(billing_use_cases),
            admin_use_cases: Arc::new(admin_use_cases),
            rate_limiter,
        };

        (app_state, mocks)
    }
}
