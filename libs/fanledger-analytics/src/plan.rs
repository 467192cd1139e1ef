use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Subscription level gating features and usage limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

/// Static per-plan limits. All checks against these are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_models: u64,
    pub retention_months: u32,
    pub monthly_transfer_bytes: u64,
    pub storage_bytes: u64,
    pub api_calls_per_minute: u64,
    pub premium_analytics: bool,
}

const FREE_LIMITS: PlanLimits = PlanLimits {
    max_models: 1,
    retention_months: 3,
    monthly_transfer_bytes: 50 * MIB,
    storage_bytes: 25 * MIB,
    api_calls_per_minute: 30,
    premium_analytics: false,
};

const PRO_LIMITS: PlanLimits = PlanLimits {
    max_models: 10,
    retention_months: 24,
    monthly_transfer_bytes: 5 * GIB,
    storage_bytes: 2 * GIB,
    api_calls_per_minute: 120,
    premium_analytics: true,
};

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => FREE_LIMITS,
            PlanTier::Pro => PRO_LIMITS,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            _ => Err(format!("Invalid plan: {}. Must be 'free' or 'pro'", s)),
        }
    }
}

/// Outcome of comparing usage plus an incoming amount against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitCheck {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub percent_used: f64,
    pub allowed: bool,
}

pub fn check_limit(used: u64, incoming: u64, limit: u64) -> LimitCheck {
    let projected = used.saturating_add(incoming);
    let percent_used = if limit == 0 {
        0.0
    } else {
        used as f64 / limit as f64 * 100.0
    };
    LimitCheck {
        used,
        limit,
        remaining: limit.saturating_sub(used),
        percent_used,
        allowed: projected <= limit,
    }
}

/// Whole months from `(from_year, from_month)` to `(to_year, to_month)`;
/// negative when `from` is later.
pub fn months_between(from_year: i32, from_month: u32, to_year: i32, to_month: u32) -> i64 {
    (to_year as i64 - from_year as i64) * 12 + (to_month as i64 - from_month as i64)
}

/// A month is retained when it is not in the future and fewer than
/// `retention_months` months lie between it and `today`'s month.
pub fn is_within_retention(year: i32, month: u32, today: NaiveDate, retention_months: u32) -> bool {
    let age = months_between(year, month, today.year(), today.month());
    age >= 0 && age < retention_months as i64
}
