//! In-memory mock implementations for user, usage and rate-limit traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        usage::{UsageRepo, UsageTotals},
        user::{UserProfile, UserRepo},
    },
    domain::entities::{PlanTier, user::UserRole},
    infra::rate_limit::RateLimiterTrait,
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, UserProfile>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial users for testing.
    pub fn with_users(users: Vec<UserProfile>) -> Self {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Mutex::new(map),
        }
    }

    pub fn get(&self, user_id: Uuid) -> Option<UserProfile> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    pub fn get_all(&self) -> Vec<UserProfile> {
        self.users.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn upsert(&self, user_id: Uuid, email: &str) -> AppResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        let now = chrono::Utc::now().naive_utc();
        let user = users.entry(user_id).or_insert_with(|| UserProfile {
            id: user_id,
            email: email.to_string(),
            name: None,
            role: UserRole::User,
            plan: PlanTier::Free,
            created_at: Some(now),
            updated_at: Some(now),
        });
        if !email.is_empty() {
            user.email = email.to_string();
        }
        Ok(user.clone())
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.get(user_id))
    }

    async fn update_name(&self, user_id: Uuid, name: &str) -> AppResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.name = Some(name.to_string());
        user.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(user.clone())
    }

    async fn set_plan(&self, user_id: Uuid, plan: PlanTier) -> AppResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.plan = plan;
        user.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(user.clone())
    }

    async fn list_all(&self) -> AppResult<Vec<UserProfile>> {
        let mut users = self.get_all();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn count_by_plan(&self) -> AppResult<Vec<(PlanTier, i64)>> {
        let mut counts: HashMap<PlanTier, i64> = HashMap::new();
        for user in self.users.lock().unwrap().values() {
            *counts.entry(user.plan).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

// ============================================================================
// InMemoryUsageRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUsageRepo {
    pub days: Mutex<HashMap<(Uuid, NaiveDate), UsageTotals>>,
    fail: bool,
}

impl InMemoryUsageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repo whose every call fails with a database error.
    pub fn failing() -> Self {
        Self {
            days: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    fn check(&self) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Database("usage store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UsageRepo for InMemoryUsageRepo {
    async fn increment(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        transfer_bytes: u64,
        api_calls: u64,
    ) -> AppResult<()> {
        self.check()?;
        let mut days = self.days.lock().unwrap();
        let day = days.entry((user_id, date)).or_default();
        day.data_transfer_bytes += transfer_bytes;
        day.api_calls += api_calls;
        Ok(())
    }

    async fn totals_since(&self, user_id: Uuid, since: NaiveDate) -> AppResult<UsageTotals> {
        self.check()?;
        let days = self.days.lock().unwrap();
        Ok(days
            .iter()
            .filter(|((uid, date), _)| *uid == user_id && *date >= since)
            .fold(UsageTotals::default(), |acc, (_, day)| UsageTotals {
                data_transfer_bytes: acc.data_transfer_bytes + day.data_transfer_bytes,
                api_calls: acc.api_calls + day.api_calls,
            }))
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter for testing.
/// Counts every call per key; no time windows.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_override: Option<u64>,
}

impl InMemoryRateLimiter {
    /// Enforce whatever limit the caller passes in.
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_override: None,
        }
    }

    /// Enforce a fixed limit regardless of plan.
    pub fn with_max(max: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_override: Some(max),
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::with_max(u64::MAX)
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, key: &str, limit: u64) -> AppResult<()> {
        let limit = self.max_override.unwrap_or(limit);
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        if *count > limit {
            return Err(AppError::RateLimited {
                retry_after_secs: 60,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_repo_upsert_is_idempotent() {
        let repo = InMemoryUserRepo::new();
        let id = Uuid::new_v4();

        repo.upsert(id, "a@example.com").await.unwrap();
        repo.set_plan(id, PlanTier::Pro).await.unwrap();
        let again = repo.upsert(id, "a@example.com").await.unwrap();

        assert_eq!(again.plan, PlanTier::Pro);
        assert_eq!(repo.get_all().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limiter_blocks_after_max() {
        let limiter = InMemoryRateLimiter::with_max(2);
        assert!(limiter.check("k", 100).await.is_ok());
        assert!(limiter.check("k", 100).await.is_ok());
        assert!(matches!(
            limiter.check("k", 100).await,
            Err(AppError::RateLimited { .. })
        ));
        assert!(limiter.check("other", 100).await.is_ok());
    }
}
