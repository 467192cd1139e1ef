//! Revenue analytics for fan-club transaction exports.
//!
//! This crate provides:
//! - CSV parsing of transaction exports into `TransactionRecord`s
//! - Revenue aggregation (totals, customers, per-type/hour/day breakdowns)
//! - Trend classification and month-over-month trend building
//! - The static plan tier table and advisory limit checks

mod errors;
mod plan;
mod record;
mod revenue;
mod trend;

pub use errors::CsvError;
pub use plan::{
    LimitCheck, PlanLimits, PlanTier, check_limit, is_within_retention, months_between,
};
pub use record::{ParsedUpload, TransactionRecord, parse_transactions_csv};
pub use revenue::{
    CustomerTotal, DailyRevenue, HourlyRevenue, MonthlySummary, RevenueAnalysis, TypeTotal,
    analyze_fan_club_revenue, customer_count, data_size_bytes, net_revenue, revenue_by_day,
    revenue_by_hour, revenue_by_type, summarize_month, top_customers, total_fees, total_revenue,
};
pub use trend::{MonthPoint, MonthlyTrend, Trend, build_monthly_trend, classify_trend};
