use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::models::{ModelProfile, ModelRepo},
    domain::entities::model::ModelStatus,
};

const SELECT_COLS: &str = "id, user_id, name, status, created_at, updated_at";

fn row_to_profile(row: &sqlx::postgres::PgRow) -> ModelProfile {
    let status: String = row.get("status");
    ModelProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        status: ModelStatus::from_str(&status),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ModelRepo for PostgresPersistence {
    async fn create(&self, user_id: Uuid, name: &str) -> AppResult<ModelProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO models (user_id, name)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(&row))
    }

    async fn get_by_id(&self, model_id: Uuid) -> AppResult<Option<ModelProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM models WHERE id = $1", SELECT_COLS))
            .bind(model_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ModelProfile>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM models
            WHERE user_id = $1
            ORDER BY created_at ASC, name ASC
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM models WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }

    async fn update(
        &self,
        model_id: Uuid,
        name: Option<&str>,
        status: Option<ModelStatus>,
    ) -> AppResult<ModelProfile> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE models
            SET name = COALESCE($2, name),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(model_id)
        .bind(name)
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        Ok(row_to_profile(&row))
    }

    async fn delete(&self, model_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(model_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
