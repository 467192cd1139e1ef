use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{SubscriptionProfile, SubscriptionRepo, SubscriptionUpsert},
    domain::entities::subscription::SubscriptionStatus,
};

const SELECT_COLS: &str = r#"
    id, user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id, status,
    current_period_start, current_period_end, cancel_at_period_end, created_at, updated_at
"#;

fn row_to_profile(row: &sqlx::postgres::PgRow) -> SubscriptionProfile {
    SubscriptionProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        stripe_price_id: row.get("stripe_price_id"),
        status: row.get("status"),
        current_period_start: row.get("current_period_start"),
        current_period_end: row.get("current_period_end"),
        cancel_at_period_end: row.get("cancel_at_period_end"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn get_by_customer(&self, customer_id: &str) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE stripe_customer_id = $1 ORDER BY updated_at DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn upsert(&self, input: &SubscriptionUpsert) -> AppResult<SubscriptionProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions (
                user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id, status,
                current_period_start, current_period_end, cancel_at_period_end
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = COALESCE(EXCLUDED.stripe_subscription_id, subscriptions.stripe_subscription_id),
                stripe_price_id = COALESCE(EXCLUDED.stripe_price_id, subscriptions.stripe_price_id),
                status = EXCLUDED.status,
                current_period_start = COALESCE(EXCLUDED.current_period_start, subscriptions.current_period_start),
                current_period_end = COALESCE(EXCLUDED.current_period_end, subscriptions.current_period_end),
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(input.user_id)
        .bind(&input.stripe_customer_id)
        .bind(&input.stripe_subscription_id)
        .bind(&input.stripe_price_id)
        .bind(input.status)
        .bind(input.current_period_start)
        .bind(input.current_period_end)
        .bind(input.cancel_at_period_end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(&row))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<SubscriptionProfile> {
        let row = sqlx::query(&format!(
            "UPDATE subscriptions SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        Ok(row_to_profile(&row))
    }

    async fn count_active(&self) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM subscriptions WHERE status = 'active'::subscription_status",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.get("count"))
    }
}
