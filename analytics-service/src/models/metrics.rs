//! Engine output types.

use serde::{Deserialize, Serialize};

/// Identifies a metric family; part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Mrr,
    Arr,
    ChurnRate,
    Ltv,
    Cac,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Mrr => "mrr",
            MetricKind::Arr => "arr",
            MetricKind::ChurnRate => "churn_rate",
            MetricKind::Ltv => "ltv",
            MetricKind::Cac => "cac",
        }
    }
}

/// The current/previous/growth triple every calculation returns.
///
/// `growth` is a percentage for MRR/ARR, an absolute delta in percentage
/// points for churn, and fixed at `0` for LTV/CAC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub current: f64,
    pub previous: f64,
    pub growth: f64,
}

/// All five metrics for one reference date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub mrr: MetricValue,
    pub arr: MetricValue,
    pub churn_rate: MetricValue,
    pub ltv: MetricValue,
    pub cac: MetricValue,
}

/// One month of the historical series, keyed `YYYY-MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub month: String,
    pub metrics: MetricsSnapshot,
}

/// Customer counts as of a month's end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerGrowthPoint {
    pub month: String,
    pub total: u64,
    pub active: u64,
    pub churned: u64,
}
