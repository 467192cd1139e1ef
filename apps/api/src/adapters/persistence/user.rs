use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{PlanTier, user::UserRole},
    use_cases::user::{UserProfile, UserRepo},
};

const SELECT_COLS: &str = "id, email, name, role, plan, created_at, updated_at";

fn parse_plan(raw: &str, user_id: Uuid) -> PlanTier {
    raw.parse().unwrap_or_else(|err: String| {
        tracing::warn!(user_id = %user_id, error = %err, "Unknown plan stored, treating as free");
        PlanTier::Free
    })
}

fn row_to_profile(row: &sqlx::postgres::PgRow) -> UserProfile {
    let id: Uuid = row.get("id");
    let role: String = row.get("role");
    let plan: String = row.get("plan");
    UserProfile {
        id,
        email: row.get("email"),
        name: row.get("name"),
        role: UserRole::from_str(&role),
        plan: parse_plan(&plan, id),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn upsert(&self, user_id: Uuid, email: &str) -> AppResult<UserProfile> {
        // An empty email from a token without the claim never overwrites a known one.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET email = CASE WHEN EXCLUDED.email = '' THEN users.email ELSE EXCLUDED.email END,
                updated_at = CASE WHEN EXCLUDED.email = '' OR EXCLUDED.email = users.email
                             THEN users.updated_at ELSE NOW() END
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(&row))
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", SELECT_COLS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn update_name(&self, user_id: Uuid, name: &str) -> AppResult<UserProfile> {
        let row = sqlx::query(&format!(
            "UPDATE users SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        Ok(row_to_profile(&row))
    }

    async fn set_plan(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UserProfile> {
        let row = sqlx::query(&format!(
            "UPDATE users SET plan = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(plan.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        Ok(row_to_profile(&row))
    }

    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY email ASC",
            SELECT_COLS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn count_by_plan(&self) -> AppResult<Vec<(PlanTier, i64)>> {
        let rows = sqlx::query("SELECT plan, COUNT(*) AS count FROM users GROUP BY plan")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut counts: Vec<(PlanTier, i64)> = Vec::new();
        for row in rows {
            let plan: String = row.get("plan");
            let count: i64 = row.get("count");
            let plan = plan.parse().unwrap_or(PlanTier::Free);
            match counts.iter_mut().find(|(p, _)| *p == plan) {
                Some((_, total)) => *total += count,
                None => counts.push((plan, count)),
            }
        }
        Ok(counts)
    }
}
