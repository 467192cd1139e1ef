use std::sync::Arc;

use fanledger_analytics::LimitCheck;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::{
        billing::SubscriptionRepo,
        usage::{UsageSnapshot, UsageUseCases},
    },
    domain::entities::{PlanTier, subscription::SubscriptionStatus},
};

pub const WARNING_PERCENT: f64 = 80.0;
pub const CRITICAL_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Storage,
    Transfer,
    Models,
    Billing,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub kind: AlertKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_used: Option<f64>,
}

fn limit_alert(kind: AlertKind, label: &str, check: &LimitCheck) -> Option<Alert> {
    let level = if check.percent_used >= CRITICAL_PERCENT {
        AlertLevel::Critical
    } else if check.percent_used >= WARNING_PERCENT {
        AlertLevel::Warning
    } else {
        return None;
    };
    let message = match level {
        AlertLevel::Critical => format!("{label} limit reached"),
        _ => format!("{label} is at {:.0}% of your plan limit", check.percent_used),
    };
    Some(Alert {
        level,
        kind,
        message,
        percent_used: Some(check.percent_used),
    })
}

/// Alerts for a usage snapshot and the caller's subscription state.
pub fn build_alerts(snapshot: &UsageSnapshot, status: Option<SubscriptionStatus>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = [
        limit_alert(AlertKind::Storage, "Storage", &snapshot.storage),
        limit_alert(AlertKind::Transfer, "Monthly data transfer", &snapshot.transfer),
        limit_alert(AlertKind::Models, "Model count", &snapshot.models),
    ]
    .into_iter()
    .flatten()
    .collect();

    if status == Some(SubscriptionStatus::PastDue) {
        alerts.push(Alert {
            level: AlertLevel::Info,
            kind: AlertKind::Billing,
            message: "Your last payment failed. Update your payment method to keep pro features."
                .into(),
            percent_used: None,
        });
    }
    alerts
}

#[derive(Clone)]
pub struct MonitoringUseCases {
    usage: Arc<UsageUseCases>,
    subscriptions: Arc<dyn SubscriptionRepo>,
}

impl MonitoringUseCases {
    pub fn new(usage: Arc<UsageUseCases>, subscriptions: Arc<dyn SubscriptionRepo>) -> Self {
        Self {
            usage,
            subscriptions,
        }
    }

    /// Current alerts for the user. Failures produce an empty list.
    #[instrument(skip(self))]
    pub async fn alerts(&self, user_id: Uuid, plan: PlanTier) -> Vec<Alert> {
        match self.collect(user_id, plan).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "Failed to build usage alerts");
                Vec::new()
            }
        }
    }

    async fn collect(&self, user_id: Uuid, plan: PlanTier) -> AppResult<Vec<Alert>> {
        let snapshot = self.usage.snapshot(user_id, plan).await?;
        let status = self
            .subscriptions
            .get_by_user(user_id)
            .await?
            .map(|s| s.status);
        Ok(build_alerts(&snapshot, status))
    }
}
