//! The metrics engine: derives subscription KPIs from the customer base.
//!
//! All reference dates are explicit parameters; the engine never reads
//! the wall clock. Persistence errors propagate unchanged to the caller;
//! there is no retry and no partial result. Division-by-zero cases are
//! pre-empted by zero-guards that return `0` for sparse-data tenants.

use crate::models::{
    Customer, CustomerGrowthPoint, MetricKind, MetricValue, MetricsSnapshot, MonthlyMetrics, Plan,
};
use crate::services::cache::{CacheKey, MetricsCache};
use crate::services::metrics::record_metric_computation;
use crate::services::repository::AnalyticsRepository;
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Percentage growth from `previous` to `current`. By policy `0` when
/// `previous` is zero, so brand-new tenants never divide by zero.
fn growth_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// First day of the month containing `date`.
fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first day of a valid month exists")
}

/// First day of the following month (exclusive upper bound of the month).
fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date) + Months::new(1)
}

/// Midnight UTC of `date`, for range filters.
fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `YYYY-MM` label of the month containing `date`.
fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn period_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[derive(Clone)]
pub struct MetricsEngine {
    repository: AnalyticsRepository,
    cache: Arc<MetricsCache>,
}

impl MetricsEngine {
    /// The cache is injected so tests can hand the engine a fresh
    /// instance with whatever TTL they need.
    pub fn new(repository: AnalyticsRepository, cache: Arc<MetricsCache>) -> Self {
        Self { repository, cache }
    }

    fn cache_key(&self, metric: MetricKind, app_id: &str, org_id: &str, date: NaiveDate) -> CacheKey {
        CacheKey {
            metric,
            app_id: app_id.to_string(),
            org_id: org_id.to_string(),
            period: period_of(date),
        }
    }

    /// Normalized monthly revenue of one customer: the plan price scaled
    /// to a month, or the customer's own `monthly_amount` when no plan
    /// resolves.
    fn monthly_revenue(customer: &Customer, plans: &HashMap<Uuid, Plan>) -> f64 {
        customer
            .plan_id
            .and_then(|id| plans.get(&id))
            .map(Plan::normalized_monthly_price)
            .unwrap_or(customer.monthly_amount)
    }

    async fn revenue_of(&self, app_id: &str, org_id: &str, customers: &[Customer]) -> Result<f64, AppError> {
        let plan_ids: Vec<Uuid> = customers.iter().filter_map(|c| c.plan_id).collect();
        let plans = self.repository.plans_by_ids(app_id, org_id, &plan_ids).await?;
        Ok(customers
            .iter()
            .map(|c| Self::monthly_revenue(c, &plans))
            .sum())
    }

    /// MRR for the month containing `month`: active customers subscribed
    /// by the month's end, summed at normalized monthly price.
    async fn monthly_recurring_revenue(
        &self,
        app_id: &str,
        org_id: &str,
        month: NaiveDate,
    ) -> Result<f64, AppError> {
        let cutoff = at_midnight(next_month_start(month));
        let customers = self
            .repository
            .list_active_subscribed_before(app_id, org_id, cutoff)
            .await?;
        self.revenue_of(app_id, org_id, &customers).await
    }

    /// Churn rate for the month containing `month`, as a percentage.
    async fn churn_rate_for_month(
        &self,
        app_id: &str,
        org_id: &str,
        month: NaiveDate,
    ) -> Result<f64, AppError> {
        let start = at_midnight(month_start(month));
        let end = at_midnight(next_month_start(month));

        let customers_at_start = self
            .repository
            .count_active_subscribed_before(app_id, org_id, start)
            .await?;
        if customers_at_start == 0 {
            return Ok(0.0);
        }

        let churned_this_month = self
            .repository
            .count_churned_between(app_id, org_id, start, end)
            .await?;

        Ok(churned_this_month as f64 / customers_at_start as f64 * 100.0)
    }

    /// Monthly recurring revenue for the month of `date`, with the prior
    /// calendar month as `previous`.
    #[instrument(skip(self))]
    pub async fn calculate_mrr(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricValue, AppError> {
        let key = self.cache_key(MetricKind::Mrr, app_id, org_id, date);
        self.cache
            .get_or_compute(key, || async move {
                record_metric_computation(app_id, org_id, MetricKind::Mrr.as_str());

                let current = self.monthly_recurring_revenue(app_id, org_id, date).await?;
                let prior_month = month_start(date) - Months::new(1);
                let previous = self
                    .monthly_recurring_revenue(app_id, org_id, prior_month)
                    .await?;

                Ok(MetricValue {
                    current,
                    previous,
                    growth: growth_pct(current, previous),
                })
            })
            .await
    }

    /// Annual recurring revenue: MRR scaled by 12; growth mirrors MRR's.
    #[instrument(skip(self))]
    pub async fn calculate_arr(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricValue, AppError> {
        let mrr = self.calculate_mrr(app_id, org_id, date).await?;

        let key = self.cache_key(MetricKind::Arr, app_id, org_id, date);
        self.cache
            .get_or_compute(key, || async move {
                record_metric_computation(app_id, org_id, MetricKind::Arr.as_str());

                Ok(MetricValue {
                    current: mrr.current * 12.0,
                    previous: mrr.previous * 12.0,
                    growth: mrr.growth,
                })
            })
            .await
    }

    /// Churn rate for the month of `date`, with the prior month as
    /// `previous`. `growth` is the delta in percentage points, not a
    /// percentage of a percentage.
    #[instrument(skip(self))]
    pub async fn calculate_churn_rate(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricValue, AppError> {
        let key = self.cache_key(MetricKind::ChurnRate, app_id, org_id, date);
        self.cache
            .get_or_compute(key, || async move {
                record_metric_computation(app_id, org_id, MetricKind::ChurnRate.as_str());

                let current = self.churn_rate_for_month(app_id, org_id, date).await?;
                let prior_month = month_start(date) - Months::new(1);
                let previous = self
                    .churn_rate_for_month(app_id, org_id, prior_month)
                    .await?;

                Ok(MetricValue {
                    current,
                    previous,
                    growth: current - previous,
                })
            })
            .await
    }

    /// Customer lifetime value: average revenue per active user divided
    /// by the monthly churn fraction of the reference month.
    ///
    /// `previous` and `growth` are not derived for LTV; both report `0`.
    #[instrument(skip(self))]
    pub async fn calculate_ltv(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricValue, AppError> {
        let key = self.cache_key(MetricKind::Ltv, app_id, org_id, date);
        self.cache
            .get_or_compute(key, || async move {
                record_metric_computation(app_id, org_id, MetricKind::Ltv.as_str());

                let customers = self.repository.list_active_customers(app_id, org_id).await?;
                let avg_revenue_per_user = if customers.is_empty() {
                    0.0
                } else {
                    self.revenue_of(app_id, org_id, &customers).await? / customers.len() as f64
                };

                let monthly_churn_rate =
                    self.churn_rate_for_month(app_id, org_id, date).await? / 100.0;

                let current = if monthly_churn_rate > 0.0 {
                    avg_revenue_per_user / monthly_churn_rate
                } else {
                    0.0
                };

                Ok(MetricValue {
                    current,
                    previous: 0.0,
                    growth: 0.0,
                })
            })
            .await
    }

    /// Customer acquisition cost: acquisition spend on the month's new
    /// customers divided by their count.
    ///
    /// `previous` and `growth` are fixed at `0`, as for LTV.
    #[instrument(skip(self))]
    pub async fn calculate_cac(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricValue, AppError> {
        let key = self.cache_key(MetricKind::Cac, app_id, org_id, date);
        self.cache
            .get_or_compute(key, || async move {
                record_metric_computation(app_id, org_id, MetricKind::Cac.as_str());

                let start = at_midnight(month_start(date));
                let end = at_midnight(next_month_start(date));
                let new_customers = self
                    .repository
                    .list_subscribed_between(app_id, org_id, start, end)
                    .await?;

                let current = if new_customers.is_empty() {
                    0.0
                } else {
                    let total_acquisition_cost: f64 = new_customers
                        .iter()
                        .map(|c| c.acquisition_cost.unwrap_or(0.0))
                        .sum();
                    total_acquisition_cost / new_customers.len() as f64
                };

                Ok(MetricValue {
                    current,
                    previous: 0.0,
                    growth: 0.0,
                })
            })
            .await
    }

    /// All five metrics for one reference date. The calculations are
    /// independent reads and run concurrently; one failure fails the
    /// whole snapshot.
    #[instrument(skip(self))]
    pub async fn get_all_metrics(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
    ) -> Result<MetricsSnapshot, AppError> {
        let (mrr, arr, churn_rate, ltv, cac) = tokio::try_join!(
            self.calculate_mrr(app_id, org_id, date),
            self.calculate_arr(app_id, org_id, date),
            self.calculate_churn_rate(app_id, org_id, date),
            self.calculate_ltv(app_id, org_id, date),
            self.calculate_cac(app_id, org_id, date),
        )?;

        Ok(MetricsSnapshot {
            mrr,
            arr,
            churn_rate,
            ltv,
            cac,
        })
    }

    /// Per-month metric snapshots, oldest first, ending at the month of
    /// `date`. Each month is computed with itself as the reference date,
    /// so its values land in the cache under that month's period key.
    #[instrument(skip(self))]
    pub async fn get_historical_data(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
        months: u32,
    ) -> Result<Vec<MonthlyMetrics>, AppError> {
        let months = months.clamp(1, 60);
        let anchor = month_start(date);

        let mut series = Vec::with_capacity(months as usize);
        for offset in (0..months).rev() {
            let month = anchor - Months::new(offset);
            let metrics = self.get_all_metrics(app_id, org_id, month).await?;
            series.push(MonthlyMetrics {
                month: month_key(month),
                metrics,
            });
        }

        Ok(series)
    }

    /// Per-month customer counts as of each month's end, oldest first,
    /// ending at the month of `date`.
    #[instrument(skip(self))]
    pub async fn get_customer_growth(
        &self,
        app_id: &str,
        org_id: &str,
        date: NaiveDate,
        months: u32,
    ) -> Result<Vec<CustomerGrowthPoint>, AppError> {
        let months = months.clamp(1, 60);
        let anchor = month_start(date);

        let mut series = Vec::with_capacity(months as usize);
        for offset in (0..months).rev() {
            let month = anchor - Months::new(offset);
            let end = at_midnight(next_month_start(month));

            let total = self
                .repository
                .count_subscribed_before(app_id, org_id, end)
                .await?;
            let churned = self
                .repository
                .count_churned_before(app_id, org_id, end)
                .await?;

            series.push(CustomerGrowthPoint {
                month: month_key(month),
                total,
                active: total.saturating_sub(churned),
                churned,
            });
        }

        Ok(series)
    }

    /// Drop every cached value, for all tenants.
    #[instrument(skip(self))]
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("metrics cache cleared");
    }
}
