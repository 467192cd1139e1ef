use async_trait::async_trait;
use fanledger_analytics::{MonthlySummary, TransactionRecord};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::monthly_data::{
        MonthlyDataProfile, MonthlyDataRepo, MonthlyDataSummary, NewMonthlyData,
    },
};

const SUMMARY_COLS: &str =
    "id, user_id, model_id, year, month, analysis, data_size, created_at, updated_at";

const SELECT_COLS: &str =
    "id, user_id, model_id, year, month, transactions, analysis, data_size, created_at, updated_at";

fn month_from_row(row: &sqlx::postgres::PgRow) -> u32 {
    let month: i32 = row.get("month");
    month.clamp(1, 12) as u32
}

fn size_from_row(row: &sqlx::postgres::PgRow) -> u64 {
    let size: i64 = row.get("data_size");
    size.max(0) as u64
}

fn row_to_summary(row: &sqlx::postgres::PgRow) -> MonthlyDataSummary {
    let id: Uuid = row.get("id");
    let analysis: serde_json::Value = row.get("analysis");
    MonthlyDataSummary {
        id,
        model_id: row.get("model_id"),
        year: row.get("year"),
        month: month_from_row(row),
        analysis: parse_json_with_fallback::<MonthlySummary>(
            &analysis,
            "analysis",
            "monthly_data",
            &id.to_string(),
        ),
        data_size: size_from_row(row),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_profile(row: &sqlx::postgres::PgRow) -> MonthlyDataProfile {
    let id: Uuid = row.get("id");
    let entity_id = id.to_string();
    let transactions: serde_json::Value = row.get("transactions");
    let analysis: serde_json::Value = row.get("analysis");
    MonthlyDataProfile {
        id,
        user_id: row.get("user_id"),
        model_id: row.get("model_id"),
        year: row.get("year"),
        month: month_from_row(row),
        transactions: parse_json_with_fallback::<Vec<TransactionRecord>>(
            &transactions,
            "transactions",
            "monthly_data",
            &entity_id,
        ),
        analysis: parse_json_with_fallback::<MonthlySummary>(
            &analysis,
            "analysis",
            "monthly_data",
            &entity_id,
        ),
        data_size: size_from_row(row),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl MonthlyDataRepo for PostgresPersistence {
    async fn upsert(&self, input: NewMonthlyData) -> AppResult<MonthlyDataSummary> {
        let transactions = serde_json::to_value(&input.transactions)
            .map_err(|e| AppError::Internal(format!("Failed to encode transactions: {}", e)))?;
        let analysis = serde_json::to_value(&input.analysis)
            .map_err(|e| AppError::Internal(format!("Failed to encode analysis: {}", e)))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO monthly_data (user_id, model_id, year, month, transactions, analysis, data_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, model_id, year, month) DO UPDATE
            SET transactions = EXCLUDED.transactions,
                analysis = EXCLUDED.analysis,
                data_size = EXCLUDED.data_size,
                updated_at = NOW()
            RETURNING {}
            "#,
            SUMMARY_COLS
        ))
        .bind(input.user_id)
        .bind(input.model_id)
        .bind(input.year)
        .bind(input.month as i32)
        .bind(transactions)
        .bind(analysis)
        .bind(input.data_size as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_summary(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MonthlyDataProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM monthly_data WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn get_by_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<MonthlyDataProfile>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM monthly_data
            WHERE user_id = $1 AND model_id = $2 AND year = $3 AND month = $4
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(model_id)
        .bind(year)
        .bind(month as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn size_for_period(
        &self,
        user_id: Uuid,
        model_id: Uuid,
        year: i32,
        month: u32,
    ) -> AppResult<Option<u64>> {
        let row = sqlx::query(
            r#"
            SELECT data_size
            FROM monthly_data
            WHERE user_id = $1 AND model_id = $2 AND year = $3 AND month = $4
            "#,
        )
        .bind(user_id)
        .bind(model_id)
        .bind(year)
        .bind(month as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(size_from_row))
    }

    async fn list(
        &self,
        user_id: Uuid,
        model_id: Option<Uuid>,
        year: Option<i32>,
    ) -> AppResult<Vec<MonthlyDataSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM monthly_data
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR model_id = $2)
              AND ($3::int IS NULL OR year = $3)
            ORDER BY year DESC, month DESC, created_at DESC
            "#,
            SUMMARY_COLS
        ))
        .bind(user_id)
        .bind(model_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_summary).collect())
    }

    async fn total_storage(&self, user_id: Uuid) -> AppResult<u64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(data_size), 0)::BIGINT AS total FROM monthly_data WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM monthly_data WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
