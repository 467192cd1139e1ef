use crate::{
    adapters::http::app_state::AppState,
    application::ports::billing_gateway::BillingGateway,
    infra::{
        config::AppConfig, db::run_migrations, postgres_persistence,
        rate_limit::FixedWindowRateLimiter, stripe_client::StripeClient,
    },
    use_cases::{
        admin::AdminUseCases,
        analytics::AnalyticsUseCases,
        billing::{BillingUseCases, SaleRepo, SubscriptionRepo, WebhookEventRepo},
        models::{ModelRepo, ModelUseCases},
        monitoring::MonitoringUseCases,
        monthly_data::{MonthlyDataRepo, MonthlyDataUseCases},
        usage::{UsageRepo, UsageUseCases},
        user::{UserRepo, UserUseCases},
    },
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.db_max_connections).await?);

    if config.run_migrations {
        run_migrations(postgres_arc.pool()).await?;
    }

    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;
    let model_repo_arc = postgres_arc.clone() as Arc<dyn ModelRepo>;
    let monthly_data_repo_arc = postgres_arc.clone() as Arc<dyn MonthlyDataRepo>;
    let usage_repo_arc = postgres_arc.clone() as Arc<dyn UsageRepo>;
    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;
    let sale_repo_arc = postgres_arc.clone() as Arc<dyn SaleRepo>;
    let webhook_event_repo_arc = postgres_arc.clone() as Arc<dyn WebhookEventRepo>;

    let gateway = Arc::new(StripeClient::new(config.stripe_secret_key.clone()))
        as Arc<dyn BillingGateway>;

    let rate_limiter = Arc::new(FixedWindowRateLimiter::new(config.rate_limit_window_secs));

    let user_use_cases = UserUseCases::new(user_repo_arc.clone(), subscription_repo_arc.clone());
    let model_use_cases = ModelUseCases::new(model_repo_arc.clone());
    let monthly_data_use_cases = MonthlyDataUseCases::new(
        monthly_data_repo_arc.clone(),
        model_repo_arc.clone(),
        usage_repo_arc.clone(),
    );
    let analytics_use_cases =
        AnalyticsUseCases::new(monthly_data_repo_arc.clone(), model_repo_arc.clone());
    let usage_use_cases = Arc::new(UsageUseCases::new(
        usage_repo_arc,
        monthly_data_repo_arc,
        model_repo_arc,
    ));
    let monitoring_use_cases =
        MonitoringUseCases::new(usage_use_cases.clone(), subscription_repo_arc.clone());
    let billing_use_cases = BillingUseCases::new(
        user_repo_arc.clone(),
        subscription_repo_arc.clone(),
        sale_repo_arc.clone(),
        webhook_event_repo_arc,
        gateway,
        config.stripe_pro_price_id.clone(),
        config.app_origin.to_string(),
    );
    let admin_use_cases = AdminUseCases::new(user_repo_arc, subscription_repo_arc, sale_repo_arc);

    Ok(AppState {
        config: Arc::new(config),
        user_use_cases: Arc::new(user_use_cases),
        model_use_cases: Arc::new(model_use_cases),
        monthly_data_use_cases: Arc::new(monthly_data_use_cases),
        analytics_use_cases: Arc::new(analytics_use_cases),
        usage_use_cases,
        monitoring_use_cases: Arc::new(monitoring_use_cases),
        billing_use_cases: Arc::new(billing_use_cases),
        admin_use_cases: Arc::new(admin_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fanledger_api=debug,tower_http=debug".into());

    let json_output = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json_output {
        // Structured JSON logs for log shippers
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .ok();
    } else {
        // Console (pretty logs)
        let console_layer = fmt::layer()
            .with_target(false) // don’t show target (module path)
            .with_level(true)
            .pretty();

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .ok();
    }
}
