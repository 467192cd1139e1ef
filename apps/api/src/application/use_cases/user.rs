use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{use_cases::billing::SubscriptionRepo, validators::validate_name},
    domain::entities::{PlanTier, subscription::SubscriptionStatus, user::UserRole},
};

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub plan: PlanTier,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Profile plus billing state, as shown on the account page.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub subscription_status: Option<SubscriptionStatus>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert the profile on first sight; refresh the email otherwise.
    async fn upsert(&self, user_id: Uuid, email: &str) -> AppResult<UserProfile>;
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
    async fn update_name(&self, user_id: Uuid, name: &str) -> AppResult<UserProfile>;
    async fn set_plan(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UserProfile>;
    async fn list_all(&self) -> AppResult<Vec<UserProfile>>;
    async fn count_by_plan(&self) -> AppResult<Vec<(PlanTier, i64)>>;
}

#[derive(Clone)]
pub struct UserUseCases {
    repo: Arc<dyn UserRepo>,
    subscriptions: Arc<dyn SubscriptionRepo>,
}

impl UserUseCases {
    pub fn new(repo: Arc<dyn UserRepo>, subscriptions: Arc<dyn SubscriptionRepo>) -> Self {
        Self {
            repo,
            subscriptions,
        }
    }

    /// Resolve the profile for an authenticated caller, creating it on the first request.
    #[instrument(skip(self))]
    pub async fn ensure_profile(&self, user_id: Uuid, email: &str) -> AppResult<UserProfile> {
        if let Some(profile) = self.repo.get_by_id(user_id).await?
            && (email.is_empty() || profile.email == email)
        {
            return Ok(profile);
        }
        self.repo.upsert(user_id, email).await
    }

    #[instrument(skip(self))]
    pub async fn get_account(&self, user_id: Uuid) -> AppResult<AccountView> {
        let profile = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let subscription_status = self
            .subscriptions
            .get_by_user(user_id)
            .await?
            .map(|s| s.status);
        Ok(AccountView {
            profile,
            subscription_status,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_name(&self, user_id: Uuid, name: &str) -> AppResult<UserProfile> {
        let name = validate_name(name, "Name")?;
        self.repo.update_name(user_id, &name).await
    }
}
