use std::collections::HashMap;

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::{Trend, TransactionRecord, classify_trend};

/// Revenue attributed to a single buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTotal {
    pub buyer: String,
    pub total: f64,
    pub transactions: usize,
}

/// Revenue attributed to a transaction type (tip, subscription, message...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTotal {
    pub kind: String,
    pub total: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRevenue {
    pub hour: u32,
    pub total: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total: f64,
    pub transactions: usize,
}

/// Full revenue breakdown for a batch of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAnalysis {
    pub total_revenue: f64,
    pub total_fees: f64,
    pub net_revenue: f64,
    pub transaction_count: usize,
    pub customer_count: usize,
    pub average_transaction: f64,
    pub top_customers: Vec<CustomerTotal>,
    pub revenue_by_type: Vec<TypeTotal>,
    pub hourly: Vec<HourlyRevenue>,
    pub daily: Vec<DailyRevenue>,
    pub trend: Trend,
}

/// Lightweight analysis stored next to each uploaded month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total_revenue: f64,
    pub total_fees: f64,
    pub net_revenue: f64,
    pub transaction_count: usize,
    pub customer_count: usize,
    pub average_transaction: f64,
    pub top_type: Option<String>,
    pub top_customer: Option<String>,
}

pub fn total_revenue(records: &[TransactionRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

pub fn total_fees(records: &[TransactionRecord]) -> f64 {
    records.iter().map(|r| r.fee).sum()
}

pub fn net_revenue(records: &[TransactionRecord]) -> f64 {
    records.iter().map(|r| r.net).sum()
}

/// Number of distinct, non-empty buyer identifiers.
pub fn customer_count(records: &[TransactionRecord]) -> usize {
    let mut seen = std::collections::HashSet::new();
    for r in records {
        let buyer = r.buyer.trim();
        if !buyer.is_empty() {
            seen.insert(buyer);
        }
    }
    seen.len()
}

/// Sums amounts per key, preserving first-seen order so that the stable sort
/// afterwards keeps ties in input order.
fn group_totals<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    key: impl Fn(&'a TransactionRecord) -> &'a str,
) -> Vec<(&'a str, f64, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();

    for r in records {
        let k = key(r);
        match index.get(k) {
            Some(&i) => {
                groups[i].1 += r.amount;
                groups[i].2 += 1;
            }
            None => {
                index.insert(k, groups.len());
                groups.push((k, r.amount, 1));
            }
        }
    }

    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
}

/// Buyers ranked by total spend, descending, truncated to `n`.
pub fn top_customers(records: &[TransactionRecord], n: usize) -> Vec<CustomerTotal> {
    let identified = records.iter().filter(|r| !r.buyer.trim().is_empty());

    group_totals(identified, |r| r.buyer.trim())
        .into_iter()
        .take(n)
        .map(|(buyer, total, transactions)| CustomerTotal {
            buyer: buyer.to_string(),
            total,
            transactions,
        })
        .collect()
}

pub fn revenue_by_type(records: &[TransactionRecord]) -> Vec<TypeTotal> {
    group_totals(records, |r| r.kind.trim())
        .into_iter()
        .map(|(kind, total, transactions)| TypeTotal {
            kind: if kind.is_empty() {
                "unknown".to_string()
            } else {
                kind.to_string()
            },
            total,
            transactions,
        })
        .collect()
}

/// Always 24 buckets; rows without a timestamp are ignored.
pub fn revenue_by_hour(records: &[TransactionRecord]) -> Vec<HourlyRevenue> {
    let mut hours: Vec<HourlyRevenue> = (0..24)
        .map(|hour| HourlyRevenue {
            hour,
            total: 0.0,
            transactions: 0,
        })
        .collect();

    for r in records {
        if let Some(date) = r.date {
            let bucket = &mut hours[date.hour() as usize];
            bucket.total += r.amount;
            bucket.transactions += 1;
        }
    }
    hours
}

pub fn revenue_by_day(records: &[TransactionRecord]) -> Vec<DailyRevenue> {
    let mut days: std::collections::BTreeMap<NaiveDate, (f64, usize)> = Default::default();
    for r in records {
        if let Some(date) = r.date {
            let entry = days.entry(date.date()).or_insert((0.0, 0));
            entry.0 += r.amount;
            entry.1 += 1;
        }
    }
    days.into_iter()
        .map(|(date, (total, transactions))| DailyRevenue {
            date,
            total,
            transactions,
        })
        .collect()
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

pub fn analyze_fan_club_revenue(records: &[TransactionRecord], top_n: usize) -> RevenueAnalysis {
    let total = total_revenue(records);
    let daily = revenue_by_day(records);
    let daily_totals: Vec<f64> = daily.iter().map(|d| d.total).collect();

    RevenueAnalysis {
        total_revenue: total,
        total_fees: total_fees(records),
        net_revenue: net_revenue(records),
        transaction_count: records.len(),
        customer_count: customer_count(records),
        average_transaction: average(total, records.len()),
        top_customers: top_customers(records, top_n),
        revenue_by_type: revenue_by_type(records),
        hourly: revenue_by_hour(records),
        daily,
        trend: classify_trend(&daily_totals),
    }
}

pub fn summarize_month(records: &[TransactionRecord]) -> MonthlySummary {
    let total = total_revenue(records);
    MonthlySummary {
        total_revenue: total,
        total_fees: total_fees(records),
        net_revenue: net_revenue(records),
        transaction_count: records.len(),
        customer_count: customer_count(records),
        average_transaction: average(total, records.len()),
        top_type: revenue_by_type(records).into_iter().next().map(|t| t.kind),
        top_customer: top_customers(records, 1).into_iter().next().map(|c| c.buyer),
    }
}

/// Size of the JSON form of the batch, which is what gets stored and billed.
pub fn data_size_bytes(records: &[TransactionRecord]) -> u64 {
    serde_json::to_vec(records)
        .map(|bytes| bytes.len() as u64)
        .unwrap_or(0)
}
