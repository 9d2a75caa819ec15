//! Plan handlers with multi-tenant support.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::DateTime;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{CreatePlanRequest, ListQuery, ListResponse, PlanResponse},
    middleware::TenantContext,
    models::Plan,
    AppState,
};

/// Create a new plan within the tenant's scope.
pub async fn create_plan(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), AppError> {
    let plan = Plan {
        id: Uuid::new_v4(),
        app_id: tenant.app_id.clone(),
        org_id: tenant.org_id.clone(),
        name: payload.name,
        price: payload.price,
        billing_cycle: payload.billing_cycle,
        is_active: true,
        created_at: DateTime::now(),
    };

    tracing::info!(
        plan_id = %plan.id,
        app_id = %tenant.app_id,
        org_id = %tenant.org_id,
        billing_cycle = plan.billing_cycle.as_str(),
        "Creating plan"
    );

    state.repository.create_plan(plan.clone()).await?;

    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// Get a plan by ID within the tenant's scope.
pub async fn get_plan(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanResponse>, AppError> {
    let plan = state
        .repository
        .get_plan_in_tenant(&tenant.app_id, &tenant.org_id, plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Plan not found")))?;

    Ok(Json(PlanResponse::from(plan)))
}

/// List plans within the tenant's scope.
pub async fn list_plans(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<PlanResponse>>, AppError> {
    let (plans, total) = state
        .repository
        .list_plans_in_tenant(
            &tenant.app_id,
            &tenant.org_id,
            query.limit.clamp(1, 100),
            query.offset,
        )
        .await?;

    Ok(Json(ListResponse {
        items: plans.into_iter().map(PlanResponse::from).collect(),
        total,
    }))
}
