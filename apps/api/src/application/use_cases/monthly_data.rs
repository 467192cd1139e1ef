use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use fanledger_analytics::{
    MonthlySummary, ParsedUpload, TransactionRecord, check_limit, data_size_bytes,
    is_within_retention, parse_transactions_csv, summarize_month,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        use_cases::{
            models::ModelRepo,
            usage::{UsageRepo, month_start},
        },
        validators::validate_period,
    },
    domain::entities::PlanTier,
};

/// A stored month of transactions, including the raw rows.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyDataProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub model_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub transactions: Vec<TransactionRecord>,
    pub analysis: MonthlySummary,
    pub data_size: u64,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A stored month without its raw rows. Used for listings.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyDataSummary {
    pub id: Uuid,
    pub model_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub analysis: MonthlySummary,
    pub data_size: u64,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<&MonthlyDataProfile> for MonthlyDataSummary {
    fn from(p: &MonthlyDataProfile) -> Self {
        Self {
            id: p.id,
            model_id: p.model_id,
            year: p.year,
            month: p.month,
            analysis: p.analysis.clone(),
            data_size: p.data_size,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

pub struct NewMonthlyData {
    pub user_id: Uuid,
    pub model_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub transactions: Vec<TransactionRecord>,
    pub analysis: MonthlySummary,
    pub data_size: u64,
}

#[async_trait]
pub trait MonthlyDataRepo: Send + Sync {
    /// Insert or replace the row for (user, model, year, month).
    async fn upsert(&self, input: NewMonthlyData) -> AppResult<MonthlyDataSummary>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MonthlyDataProfile>>;
    async fn get_by_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<MonthlyDataProfile>>;
    /// Size of the row currently stored for the period, if any.
    async fn size_for_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<u64>>;
    /// Newest month first.
    async fn list(
        &self,
        user_id: Uuid,
        model_id: Option<Uuid>,
        year: Option<i32>,
    ) -> AppResult<Vec<MonthlyDataSummary>>;
    async fn total_storage(&self, user_id: Uuid) -> AppResult<u64>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Upload payload: either a raw CSV export or already-parsed rows.
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub model_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub csv: Option<String>,
    pub transactions: Option<Vec<TransactionRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub data: MonthlyDataSummary,
    pub skipped_rows: usize,
}

#[derive(Clone)]
pub struct MonthlyDataUseCases {
    repo: Arc<dyn MonthlyDataRepo>,
    models: Arc<dyn ModelRepo>,
    usage: Arc<dyn UsageRepo>,
}

impl MonthlyDataUseCases {
    pub fn new(
        repo: Arc<dyn MonthlyDataRepo>,
        models: Arc<dyn ModelRepo>,
        usage: Arc<dyn UsageRepo>,
    ) -> Self {
        Self {
            repo,
            models,
            usage,
        }
    }

    #[instrument(skip(self, input), fields(model_id = %input.model_id, year = input.year, month = input.month))]
    pub async fn upload(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        input: UploadInput,
    ) -> AppResult<UploadOutcome> {
        self.upload_on(user_id, plan, input, Utc::now().date_naive())
            .await
    }

    pub async fn upload_on(
        &self,
        user_id: Uuid,
        plan: PlanTier,
        input: UploadInput,
        today: NaiveDate,
    ) -> AppResult<UploadOutcome> {
        validate_period(input.year, input.month)?;
        self.require_model(user_id, input.model_id).await?;

        let parsed = match (input.csv, input.transactions) {
            (Some(csv), None) => parse_transactions_csv(&csv)?,
            (None, Some(records)) => ParsedUpload {
                records,
                skipped_rows: 0,
            },
            (Some(_), Some(_)) => {
                return Err(AppError::InvalidInput(
                    "Provide either csv or transactions, not both".into(),
                ));
            }
            (None, None) => {
                return Err(AppError::InvalidInput(
                    "Either csv or transactions is required".into(),
                ));
            }
        };
        if parsed.records.is_empty() {
            return Err(AppError::InvalidInput("No valid transactions found".into()));
        }

        let analysis = summarize_month(&parsed.records);
        let size = data_size_bytes(&parsed.records);
        let limits = plan.limits();

        if !is_within_retention(input.year, input.month, today, limits.retention_months) {
            return Err(AppError::PlanLimitExceeded(format!(
                "The {plan} plan keeps the last {} months of data",
                limits.retention_months
            )));
        }

        let transfer = self.usage.totals_since(user_id, month_start(today)).await?;
        if !check_limit(
            transfer.data_transfer_bytes,
            size,
            limits.monthly_transfer_bytes,
        )
        .allowed
        {
            return Err(AppError::PlanLimitExceeded(
                "Monthly data transfer limit reached".into(),
            ));
        }

        let stored = self.repo.total_storage(user_id).await?;
        let replaced = self
            .repo
            .size_for_period(user_id, input.model_id, input.year, input.month)
            .await?
            .unwrap_or(0);
        if !check_limit(stored.saturating_sub(replaced), size, limits.storage_bytes).allowed {
            return Err(AppError::PlanLimitExceeded("Storage limit reached".into()));
        }

        let data = self
            .repo
            .upsert(NewMonthlyData {
                user_id,
                model_id: input.model_id,
                year: input.year,
                month: input.month,
                transactions: parsed.records,
                analysis,
                data_size: size,
            })
            .await?;

        if let Err(e) = self.usage.increment(user_id, today, size, 0).await {
            tracing::warn!(error = %e, %user_id, bytes = size, "Failed to track data transfer");
        }

        tracing::info!(
            %user_id,
            model_id = %data.model_id,
            bytes = size,
            skipped_rows = parsed.skipped_rows,
            "Monthly data stored"
        );

        Ok(UploadOutcome {
            data,
            skipped_rows: parsed.skipped_rows,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        model_id: Option<Uuid>,
        year: Option<i32>,
    ) -> AppResult<Vec<MonthlyDataSummary>> {
        if let Some(model_id) = model_id {
            self.require_model(user_id, model_id).await?;
        }
        self.repo.list(user_id, model_id, year).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<MonthlyDataProfile> {
        let row = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if row.user_id != user_id {
            return Err(AppError::NotFound);
        }
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let row = self.get(user_id, id).await?;
        self.repo.delete(row.id).await
    }

    async fn require_model(&self, user_id: Uuid, model_id: Uuid) -> AppResult<()> {
        match self.models.get_by_id(model_id).await? {
            Some(model) if model.user_id == user_id => Ok(()),
            _ => Err(AppError::NotFound),
        }
    }
}
