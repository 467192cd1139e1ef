use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::validate_name,
    domain::entities::{PlanTier, model::ModelStatus},
};

/// A tracked creator whose revenue exports get uploaded month by month.
#[derive(Debug, Clone, Serialize)]
pub struct ModelProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: ModelStatus,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[async_trait]
pub trait ModelRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, name: &str) -> AppResult<ModelProfile>;
    async fn get_by_id(&self, model_id: Uuid) -> AppResult<Option<ModelProfile>>;
    /// Oldest first.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ModelProfile>>;
    async fn count_by_user(&self, user_id: Uuid) -> AppResult<u64>;
    async fn update(
        &self,
        model_id: Uuid,
        name: Option<&str>,
        status: Option<ModelStatus>,
    ) -> AppResult<ModelProfile>;
    /// Deletes the model and, through the foreign key, its monthly data.
    async fn delete(&self, model_id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct ModelUseCases {
    repo: Arc<dyn ModelRepo>,
}

impl ModelUseCases {
    pub fn new(repo: Arc<dyn ModelRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn list_models(&self, user_id: Uuid) -> AppResult<Vec<ModelProfile>> {
        self.repo.list_by_user(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn create_model(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        name: &str,
    ) -> AppResult<ModelProfile> {
        let name = validate_name(name, "Model name")?;

        let max_models = plan.limits().max_models;
        let existing = self.repo.list_by_user(user_id).await?;
        if existing.len() as u64 >= max_models {
            return Err(AppError::PlanLimitExceeded(format!(
                "The {plan} plan allows {max_models} model(s)"
            )));
        }
        if existing.iter().any(|m| m.name.eq_ignore_ascii_case(&name)) {
            return Err(AppError::InvalidInput(
                "A model with this name already exists".into(),
            ));
        }

        self.repo.create(user_id, &name).await
    }

    /// Fetch a model owned by `user_id`. Other users' models look like missing ones.
    #[instrument(skip(self))]
    pub async fn get_model(&self, user_id: Uuid, model_id: Uuid) -> AppResult<ModelProfile> {
        let model = self
            .repo
            .get_by_id(model_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if model.user_id != user_id {
            return Err(AppError::NotFound);
        }
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn update_model(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        name: Option<&str>,
        status: Option<ModelStatus>,
    ) -> AppResult<ModelProfile> {
        let model = self.get_model(user_id, model_id).await?;

        let name = match name {
            Some(raw) => {
                let name = validate_name(raw, "Model name")?;
                let siblings = self.repo.list_by_user(user_id).await?;
                if siblings
                    .iter()
                    .any(|m| m.id != model.id && m.name.eq_ignore_ascii_case(&name))
                {
                    return Err(AppError::InvalidInput(
                        "A model with this name already exists".into(),
                    ));
                }
                Some(name)
            }
            None => None,
        };

        self.repo.update(model.id, name.as_deref(), status).await
    }

    #[instrument(skip(self))]
    pub async fn delete_model(&self, user_id: Uuid, model_id: Uuid) -> AppResult<()> {
        let model = self.get_model(user_id, model_id).await?;
        self.repo.delete(model.id).await
    }
}
