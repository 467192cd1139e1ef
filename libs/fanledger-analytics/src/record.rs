use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::CsvError;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];

/// One row of a fan-club transaction export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub net: f64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub buyer: String,
}

impl TransactionRecord {
    /// Build a record with `net` derived from amount and fee.
    pub fn new(
        date: Option<NaiveDateTime>,
        amount: f64,
        fee: f64,
        kind: impl Into<String>,
        buyer: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            fee,
            net: amount - fee,
            kind: kind.into(),
            target: String::new(),
            buyer: buyer.into(),
        }
    }
}

/// Result of parsing an export: the usable rows plus how many were dropped.
#[derive(Debug, Clone, Default)]
pub struct ParsedUpload {
    pub records: Vec<TransactionRecord>,
    pub skipped_rows: usize,
}

struct Columns {
    date: Option<usize>,
    amount: usize,
    fee: Option<usize>,
    net: Option<usize>,
    kind: Option<usize>,
    target: Option<usize>,
    buyer: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CsvError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };
        Ok(Self {
            date: find("date"),
            amount: find("amount").ok_or(CsvError::MissingColumn("amount"))?,
            fee: find("fee"),
            net: find("net"),
            kind: find("type"),
            target: find("target"),
            buyer: find("buyer"),
        })
    }
}

/// Parse a CSV export keyed by its header row.
///
/// Rows whose amount is missing or unreadable are skipped and counted.
pub fn parse_transactions_csv(input: &str) -> Result<ParsedUpload, CsvError> {
    if input.trim().is_empty() {
        return Err(CsvError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let columns = Columns::from_headers(reader.headers()?)?;
    let mut parsed = ParsedUpload::default();

    for row in reader.records() {
        let row = row?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");

        let Some(amount) = parse_amount(field(Some(columns.amount))) else {
            parsed.skipped_rows += 1;
            continue;
        };
        let fee = parse_amount(field(columns.fee)).unwrap_or(0.0);
        let net = parse_amount(field(columns.net)).unwrap_or(amount - fee);

        parsed.records.push(TransactionRecord {
            date: parse_date(field(columns.date)),
            amount,
            fee,
            net,
            kind: field(columns.kind).to_string(),
            target: field(columns.target).to_string(),
            buyer: field(columns.buyer).to_string(),
        });
    }

    Ok(parsed)
}

/// Parse a money cell such as `$1,234.50`, `12` or `(3.00)`.
fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
