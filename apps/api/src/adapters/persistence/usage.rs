use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::usage::{UsageRepo, UsageTotals},
};

#[async_trait]
impl UsageRepo for PostgresPersistence {
    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        transfer_bytes: u64,
        api_calls: u64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO usage_tracking (user_id, date, data_transfer_bytes, api_calls)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date) DO UPDATE
            SET data_transfer_bytes = usage_tracking.data_transfer_bytes + EXCLUDED.data_transfer_bytes,
                api_calls = usage_tracking.api_calls + EXCLUDED.api_calls,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(transfer_bytes as i64)
        .bind(api_calls as i64)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn totals_since(&self, user_id: Uuid, since: NaiveDate) -> AppResult<UsageTotals> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(data_transfer_bytes), 0)::BIGINT AS transfer,
                   COALESCE(SUM(api_calls), 0)::BIGINT AS api_calls
            FROM usage_tracking
            WHERE user_id = $1 AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let transfer: i64 = row.get("transfer");
        let api_calls: i64 = row.get("api_calls");
        Ok(UsageTotals {
            data_transfer_bytes: transfer.max(0) as u64,
            api_calls: api_calls.max(0) as u64,
        })
    }
}
