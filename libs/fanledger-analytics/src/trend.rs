use serde::{Deserialize, Serialize};

/// Relative change between half-averages beyond which a series counts as moving.
const TREND_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        write!(f, "{}", s)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compare the average of the second half of `values` with the first half.
///
/// Sequences shorter than two points are always `Stable`. For odd lengths the
/// middle point belongs to the second half.
pub fn classify_trend(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_avg = mean(first);
    let second_avg = mean(second);

    if first_avg == 0.0 {
        return if second_avg > 0.0 {
            Trend::Up
        } else {
            Trend::Stable
        };
    }

    let change = (second_avg - first_avg) / first_avg.abs();
    if change > TREND_THRESHOLD {
        Trend::Up
    } else if change < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// One month on a revenue trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub year: i32,
    pub month: u32,
    pub total_revenue: f64,
    /// Percent change from the previous point; `None` for the first point or
    /// when the previous month earned nothing.
    pub change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub points: Vec<MonthPoint>,
    pub trend: Trend,
    pub best_month: Option<MonthPoint>,
    pub total: f64,
}

/// Build a chronological month-over-month trend from `(year, month, total)` triples.
pub fn build_monthly_trend(months: &[(i32, u32, f64)]) -> MonthlyTrend {
    let mut sorted = months.to_vec();
    sorted.sort_by_key(|&(year, month, _)| (year, month));

    let mut points: Vec<MonthPoint> = Vec::with_capacity(sorted.len());
    for (year, month, total) in sorted {
        let change_pct = points.last().and_then(|prev| {
            if prev.total_revenue == 0.0 {
                None
            } else {
                Some((total - prev.total_revenue) / prev.total_revenue.abs() * 100.0)
            }
        });
        points.push(MonthPoint {
            year,
            month,
            total_revenue: total,
            change_pct,
        });
    }

    let totals: Vec<f64> = points.iter().map(|p| p.total_revenue).collect();

    let mut best_month: Option<MonthPoint> = None;
    for p in &points {
        if best_month
            .as_ref()
            .is_none_or(|best| p.total_revenue > best.total_revenue)
        {
            best_month = Some(p.clone());
        }
    }

    MonthlyTrend {
        trend: classify_trend(&totals),
        total: totals.iter().sum(),
        best_month,
        points,
    }
}
