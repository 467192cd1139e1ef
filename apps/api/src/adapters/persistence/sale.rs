use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{NewSale, SaleRepo, SalesTotals},
};

#[async_trait]
impl SaleRepo for PostgresPersistence {
    async fn insert(&self, sale: &NewSale) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                user_id, stripe_invoice_id, stripe_customer_id, stripe_subscription_id,
                amount_cents, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (stripe_invoice_id) DO NOTHING
            "#,
        )
        .bind(sale.user_id)
        .bind(&sale.stripe_invoice_id)
        .bind(&sale.stripe_customer_id)
        .bind(&sale.stripe_subscription_id)
        .bind(sale.amount_cents)
        .bind(&sale.currency)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn totals(&self) -> AppResult<SalesTotals> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count, COALESCE(SUM(amount_cents), 0)::BIGINT AS amount FROM sales",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(SalesTotals {
            count: row.get("count"),
            amount_cents: row.get("amount"),
        })
    }
}
