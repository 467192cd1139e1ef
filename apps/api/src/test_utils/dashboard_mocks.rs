//! In-memory mock implementations for model and monthly data repositories.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        models::{ModelProfile, ModelRepo},
        monthly_data::{MonthlyDataProfile, MonthlyDataRepo, MonthlyDataSummary, NewMonthlyData},
    },
    domain::entities::model::ModelStatus,
};

// ============================================================================
// InMemoryModelRepo
// ============================================================================

/// Keeps insertion order so listings come back oldest first.
#[derive(Default)]
pub struct InMemoryModelRepo {
    pub models: Mutex<Vec<ModelProfile>>,
}

impl InMemoryModelRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: Vec<ModelProfile>) -> Self {
        Self {
            models: Mutex::new(models),
        }
    }

    pub fn get_all(&self) -> Vec<ModelProfile> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelRepo for InMemoryModelRepo {
    async fn create(&self, user_id: Uuid, name: &str) -> AppResult<ModelProfile> {
        let mut models = self.models.lock().unwrap();
        if models.iter().any(|m| m.user_id == user_id && m.name == name) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }
        let now = chrono::Utc::now().naive_utc();
        let model = ModelProfile {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            status: ModelStatus::Active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        models.push(model.clone());
        Ok(model)
    }

    async fn get_by_id(&self, model_id: Uuid) -> AppResult<Option<ModelProfile>> {
        Ok(self
            .models
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == model_id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ModelProfile>> {
        Ok(self
            .models
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.list_by_user(user_id).await?.len() as u64)
    }

    async fn update(
        &self,
        model_id: Uuid,
        name: Option<&str>,
        status: Option<ModelStatus>,
    ) -> AppResult<ModelProfile> {
        let mut models = self.models.lock().unwrap();
        let model = models
            .iter_mut()
            .find(|m| m.id == model_id)
            .ok_or(AppError::NotFound)?;
        if let Some(name) = name {
            model.name = name.to_string();
        }
        if let Some(status) = status {
            model.status = status;
        }
        model.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(model.clone())
    }

    async fn delete(&self, model_id: Uuid) -> AppResult<()> {
        self.models.lock().unwrap().retain(|m| m.id != model_id);
        Ok(())
    }
}

// ============================================================================
// InMemoryMonthlyDataRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryMonthlyDataRepo {
    pub rows: Mutex<Vec<MonthlyDataProfile>>,
}

impl InMemoryMonthlyDataRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<MonthlyDataProfile>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn get_all(&self) -> Vec<MonthlyDataProfile> {
        self.rows.lock().unwrap().clone()
    }

    fn find_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> Option<MonthlyDataProfile> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.user_id == user_id && r.model_id == model_id && r.year == year && r.month == month
            })
            .cloned()
    }
}

#[async_trait]
impl MonthlyDataRepo for InMemoryMonthlyDataRepo {
    async fn upsert(&self, input: NewMonthlyData) -> AppResult<MonthlyDataSummary> {
        let mut rows = self.rows.lock().unwrap();
        let now = chrono::Utc::now().naive_utc();
        let existing = rows.iter_mut().find(|r| {
            r.user_id == input.user_id
                && r.model_id == input.model_id
                && r.year == input.year
                && r.month == input.month
        });

        let row = match existing {
            Some(row) => {
                row.transactions = input.transactions;
                row.analysis = input.analysis;
                row.data_size = input.data_size;
                row.updated_at = Some(now);
                row.clone()
            }
            None => {
                let row = MonthlyDataProfile {
                    id: Uuid::new_v4(),
                    user_id: input.user_id,
                    model_id: input.model_id,
                    year: input.year,
                    month: input.month,
                    transactions: input.transactions,
                    analysis: input.analysis,
                    data_size: input.data_size,
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                rows.push(row.clone());
                row
            }
        };
        Ok(MonthlyDataSummary::from(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MonthlyDataProfile>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn get_by_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<MonthlyDataProfile>> {
        Ok(self.find_period(user_id, model_id, year, month))
    }

    async fn size_for_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<u64>> {
        Ok(self
            .find_period(user_id, model_id, year, month)
            .map(|r| r.data_size))
    }

    async fn list(
        &self,
        user_id: Uuid,
        model_id: Option<Uuid>,
        year: Option<i32>,
    ) -> AppResult<Vec<MonthlyDataSummary>> {
        let mut rows: Vec<MonthlyDataSummary> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| model_id.is_none_or(|id| r.model_id == id))
            .filter(|r| year.is_none_or(|y| r.year == y))
            .map(MonthlyDataSummary::from)
            .collect();
        rows.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(rows)
    }

    async fn total_storage(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.data_size)
            .sum())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}
