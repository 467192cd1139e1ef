use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        billing::{SaleRepo, SalesTotals, SubscriptionRepo},
        user::{UserProfile, UserRepo},
    },
    domain::entities::PlanTier,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanCounts {
    pub free: i64,
    pub pro: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub users_by_plan: PlanCounts,
    pub active_subscriptions: i64,
    pub sales: SalesTotals,
}

/// Operator-level views across all users. Callers must be admins.
#[derive(Clone)]
pub struct AdminUseCases {
    users: Arc<dyn UserRepo>,
    subscriptions: Arc<dyn SubscriptionRepo>,
    sales: Arc<dyn SaleRepo>,
}

impl AdminUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        subscriptions: Arc<dyn SubscriptionRepo>,
        sales: Arc<dyn SaleRepo>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            sales,
        }
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> AppResult<AdminOverview> {
        let mut users_by_plan = PlanCounts::default();
        for (plan, count) in self.users.count_by_plan().await? {
            match plan {
                PlanTier::Free => users_by_plan.free += count,
                PlanTier::Pro => users_by_plan.pro += count,
            }
        }

        Ok(AdminOverview {
            total_users: users_by_plan.free + users_by_plan.pro,
            users_by_plan,
            active_subscriptions: self.subscriptions.count_active().await?,
            sales: self.sales.totals().await?,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        self.users.list_all().await
    }

    #[instrument(skip(self))]
    pub async fn set_user_plan(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UserProfile> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        let updated = self.users.set_plan(user_id, plan).await?;
        tracing::info!(%user_id, %plan, "Plan changed by admin");
        Ok(updated)
    }
}
