use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use fanledger_analytics::{
    MonthlyTrend, RevenueAnalysis, analyze_fan_club_revenue, build_monthly_trend, months_between,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        use_cases::{models::ModelRepo, monthly_data::MonthlyDataRepo},
        validators::validate_period,
    },
    domain::entities::PlanTier,
};

pub const DEFAULT_TOP_CUSTOMERS: usize = 10;
pub const MAX_TOP_CUSTOMERS: usize = 100;
pub const FREE_TOP_CUSTOMERS: usize = 3;
pub const DEFAULT_TREND_MONTHS: u32 = 12;

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    #[serde(flatten)]
    pub analysis: RevenueAnalysis,
    pub premium: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub model_id: Uuid,
    pub months: u32,
    #[serde(flatten)]
    pub trend: MonthlyTrend,
}

/// Cut a full analysis down to what the free plan shows.
pub fn restrict_to_free(mut analysis: RevenueAnalysis) -> RevenueAnalysis {
    analysis.top_customers.truncate(FREE_TOP_CUSTOMERS);
    analysis.hourly.clear();
    analysis.daily.clear();
    analysis
}

#[derive(Clone)]
pub struct AnalyticsUseCases {
    monthly_data: Arc<dyn MonthlyDataRepo>,
    models: Arc<dyn ModelRepo>,
}

impl AnalyticsUseCases {
    pub fn new(monthly_data: Arc<dyn MonthlyDataRepo>, models: Arc<dyn ModelRepo>) -> Self {
        Self {
            monthly_data,
            models,
        }
    }

    #[instrument(skip(self))]
    pub async fn revenue(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        model_id: Uuid,
        year: i32,
        month: u32,
        top: Option<usize>,
    ) -> AppResult<RevenueReport> {
        validate_period(year, month)?;
        self.require_model(user_id, model_id).await?;

        let row = self
            .monthly_data
            .get_by_period(user_id, model_id, year, month)
            .await?
            .ok_or(AppError::NotFound)?;

        let top_n = top
            .unwrap_or(DEFAULT_TOP_CUSTOMERS)
            .clamp(1, MAX_TOP_CUSTOMERS);
        let analysis = analyze_fan_club_revenue(&row.transactions, top_n);
        let premium = plan.limits().premium_analytics;

        Ok(RevenueReport {
            analysis: if premium {
                analysis
            } else {
                restrict_to_free(analysis)
            },
            premium,
        })
    }

    #[instrument(skip(self))]
    pub async fn trends(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        model_id: Uuid,
        months: Option<u32>,
    ) -> AppResult<TrendReport> {
        self.trends_on(user_id, plan, model_id, months, Utc::now().date_naive())
            .await
    }

    pub async fn trends_on(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        model_id: Uuid,
        months: Option<u32>,
        today: NaiveDate,
    ) -> AppResult<TrendReport> {
        let limits = plan.limits();
        if !limits.premium_analytics {
            return Err(AppError::PremiumRequired);
        }
        self.require_model(user_id, model_id).await?;

        let months = months
            .unwrap_or(DEFAULT_TREND_MONTHS)
            .clamp(1, limits.retention_months);

        let points: Vec<(i32, u32, f64)> = self
            .monthly_data
            .list(user_id, Some(model_id), None)
            .await?
            .into_iter()
            .filter(|row| {
                let age = months_between(row.year, row.month, today.year(), today.month());
                age >= 0 && age < months as i64
            })
            .map(|row| (row.year, row.month, row.analysis.total_revenue))
            .collect();

        Ok(TrendReport {
            model_id,
            months,
            trend: build_monthly_trend(&points),
        })
    }

    async fn require_model(&self, user_id: Uuid, model_id: Uuid) -> AppResult<()> {
        match self.models.get_by_id(model_id).await? {
            Some(model) if model.user_id == user_id => Ok(()),
            _ => Err(AppError::NotFound),
        }
    }
}
