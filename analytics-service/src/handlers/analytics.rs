//! Analytics handlers: thin adapters over the metrics engine.
//!
//! Each handler extracts the tenant, parses the explicit reference date,
//! delegates to the engine and maps errors through `AppError`. No
//! business logic lives here.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{MetricQuery, SeriesQuery},
    middleware::TenantContext,
    models::{CustomerGrowthPoint, MetricValue, MetricsSnapshot, MonthlyMetrics},
    AppState,
};

pub async fn mrr(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricValue>, AppError> {
    let value = state
        .engine
        .calculate_mrr(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(value))
}

pub async fn arr(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricValue>, AppError> {
    let value = state
        .engine
        .calculate_arr(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(value))
}

pub async fn churn_rate(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricValue>, AppError> {
    let value = state
        .engine
        .calculate_churn_rate(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(value))
}

pub async fn ltv(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricValue>, AppError> {
    let value = state
        .engine
        .calculate_ltv(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(value))
}

pub async fn cac(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricValue>, AppError> {
    let value = state
        .engine
        .calculate_cac(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(value))
}

/// Full snapshot of all five metrics for one reference date.
pub async fn summary(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<MetricQuery>,
) -> Result<Json<MetricsSnapshot>, AppError> {
    let snapshot = state
        .engine
        .get_all_metrics(&tenant.app_id, &tenant.org_id, query.date)
        .await?;
    Ok(Json(snapshot))
}

/// Per-month snapshots, oldest first, ending at the month of `date`.
pub async fn history(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<MonthlyMetrics>>, AppError> {
    let series = state
        .engine
        .get_historical_data(&tenant.app_id, &tenant.org_id, query.date, query.months)
        .await?;
    Ok(Json(series))
}

/// Per-month customer counts, oldest first, ending at the month of `date`.
pub async fn customer_growth(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<CustomerGrowthPoint>>, AppError> {
    let series = state
        .engine
        .get_customer_growth(&tenant.app_id, &tenant.org_id, query.date, query.months)
        .await?;
    Ok(Json(series))
}

/// Drop every cached metric value, for all tenants.
pub async fn refresh(State(state): State<AppState>) -> StatusCode {
    state.engine.clear_cache();
    StatusCode::NO_CONTENT
}
