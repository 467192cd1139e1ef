use std::sync::Arc;

use crate::{
    infra::{RateLimiterTrait, config::AppConfig},
    use_cases::{
        admin::AdminUseCases, analytics::AnalyticsUseCases, billing::BillingUseCases,
        models::ModelUseCases, monitoring::MonitoringUseCases,
        monthly_data::MonthlyDataUseCases, usage::UsageUseCases, user::UserUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_use_cases: Arc<UserUseCases>,
    pub model_use_cases: Arc<ModelUseCases>,
    pub monthly_data_use_cases: Arc<MonthlyDataUseCases>,
    pub analytics_use_cases: Arc<AnalyticsUseCases>,
    pub usage_use_cases: Arc<UsageUseCases>,
    pub monitoring_use_cases: Arc<MonitoringUseCases>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub admin_use_cases: Arc<AdminUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
