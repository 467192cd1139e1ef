//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use fanledger_analytics::MonthlySummary;
use uuid::Uuid;

use crate::{
    application::use_cases::{
        billing::SubscriptionProfile, models::ModelProfile, monthly_data::MonthlyDataProfile,
        user::UserProfile,
    },
    domain::entities::{
        PlanTier, model::ModelStatus, subscription::SubscriptionStatus, user::UserRole,
    },
};

/// Create a test user (free plan, regular role) with sensible defaults.
pub fn create_test_user(overrides: impl FnOnce(&mut UserProfile)) -> UserProfile {
    let id = Uuid::new_v4();
    let mut user = UserProfile {
        id,
        email: format!("user-{}@example.com", id.simple()),
        name: None,
        role: UserRole::User,
        plan: PlanTier::Free,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut user);
    user
}

/// Create a test model owned by `user_id`.
pub fn create_test_model(user_id: Uuid, overrides: impl FnOnce(&mut ModelProfile)) -> ModelProfile {
    let mut model = ModelProfile {
        id: Uuid::new_v4(),
        user_id,
        name: "Test Model".to_string(),
        status: ModelStatus::Active,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut model);
    model
}

/// Create a stored month (May 2024, no transactions) for a user's model.
pub fn create_test_monthly_data(
    user_id: Uuid,
    model_id: Uuid,
    overrides: impl FnOnce(&mut MonthlyDataProfile),
) -> MonthlyDataProfile {
    let mut row = MonthlyDataProfile {
        id: Uuid::new_v4(),
        user_id,
        model_id,
        year: 2024,
        month: 5,
        transactions: vec![],
        analysis: MonthlySummary::default(),
        data_size: 0,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut row);
    row
}

/// Create an active test subscription for `user_id`.
pub fn create_test_subscription(
    user_id: Uuid,
    overrides: impl FnOnce(&mut SubscriptionProfile),
) -> SubscriptionProfile {
    let mut subscription = SubscriptionProfile {
        id: Uuid::new_v4(),
        user_id,
        stripe_customer_id: format!("cus_test{}", Uuid::new_v4().simple()),
        stripe_subscription_id: Some(format!("sub_test{}", Uuid::new_v4().simple())),
        stripe_price_id: Some("price_test_pro".to_string()),
        status: SubscriptionStatus::Active,
        current_period_start: Some(test_datetime()),
        current_period_end: Some(test_datetime_offset_days(30)),
        cancel_at_period_end: false,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut subscription);
    subscription
}

/// Returns a consistent test datetime.
pub fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Returns a test datetime offset by the given number of days.
fn test_datetime_offset_days(days: i64) -> NaiveDateTime {
    test_datetime() + chrono::Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_with_defaults() {
        let user = create_test_user(|_| {});
        assert_eq!(user.plan, PlanTier::Free);
        assert_eq!(user.role, UserRole::User);
        assert!(user.email.ends_with("@example.com"));
    }

    #[test]
    fn test_create_subscription_with_overrides() {
        let user_id = Uuid::new_v4();
        let sub = create_test_subscription(user_id, |s| s.status = SubscriptionStatus::PastDue);
        assert_eq!(sub.user_id, user_id);
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert!(sub.stripe_customer_id.starts_with("cus_test"));
    }
}
