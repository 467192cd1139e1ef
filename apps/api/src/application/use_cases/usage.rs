use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use fanledger_analytics::{LimitCheck, PlanLimits, check_limit};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::{models::ModelRepo, monthly_data::MonthlyDataRepo},
    domain::entities::PlanTier,
};

/// Accumulated metering counters over some range of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub data_transfer_bytes: u64,
    pub api_calls: u64,
}

#[async_trait]
pub trait UsageRepo: Send + Sync {
    /// Atomically add to the (user, date) counters, creating the row if needed.
    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        transfer_bytes: u64,
        api_calls: u64,
    ) -> AppResult<()>;
    /// Sum of counters from `since` (inclusive) onwards.
    async fn totals_since(&self, user_id: Uuid, since: NaiveDate) -> AppResult<UsageTotals>;
}

/// Current usage measured against the plan's limits.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsageSnapshot {
    pub storage: LimitCheck,
    pub transfer: LimitCheck,
    pub models: LimitCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub plan: PlanTier,
    pub limits: PlanLimits,
    pub today: UsageTotals,
    pub month_to_date: UsageTotals,
    pub storage: LimitCheck,
    pub transfer: LimitCheck,
    pub models: LimitCheck,
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

#[derive(Clone)]
pub struct UsageUseCases {
    usage: Arc<dyn UsageRepo>,
    monthly_data: Arc<dyn MonthlyDataRepo>,
    models: Arc<dyn ModelRepo>,
}

impl UsageUseCases {
    pub fn new(
        usage: Arc<dyn UsageRepo>,
        monthly_data: Arc<dyn MonthlyDataRepo>,
        models: Arc<dyn ModelRepo>,
    ) -> Self {
        Self {
            usage,
            monthly_data,
            models,
        }
    }

    /// Count one API call for today. Metering never fails the request.
    pub async fn track_api_call(&self, user_id: Uuid) {
        let today = Utc::now().date_naive();
        if let Err(e) = self.usage.increment(user_id, today, 0, 1).await {
            tracing::warn!(error = %e, %user_id, "Failed to track API call");
        }
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UsageSnapshot> {
        self.snapshot_on(user_id, plan, Utc::now().date_naive())
            .await
    }

    pub async fn snapshot_on(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        today: NaiveDate,
    ) -> AppResult<UsageSnapshot> {
        let limits = plan.limits();
        let storage_used = self.monthly_data.total_storage(user_id).await?;
        let month = self.usage.totals_since(user_id, month_start(today)).await?;
        let model_count = self.models.count_by_user(user_id).await?;

        Ok(UsageSnapshot {
            storage: check_limit(storage_used, 0, limits.storage_bytes),
            transfer: check_limit(month.data_transfer_bytes, 0, limits.monthly_transfer_bytes),
            models: check_limit(model_count, 0, limits.max_models),
        })
    }

    #[instrument(skip(self))]
    pub async fn usage_stats(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UsageStats> {
        let today = Utc::now().date_naive();
        let snapshot = self.snapshot_on(user_id, plan, today).await?;
        let today_totals = self.usage.totals_since(user_id, today).await?;
        let month_to_date = self.usage.totals_since(user_id, month_start(today)).await?;

        Ok(UsageStats {
            plan,
            limits: plan.limits(),
            today: today_totals,
            month_to_date,
            storage: snapshot.storage,
            transfer: snapshot.transfer,
            models: snapshot.models,
        })
    }
}
