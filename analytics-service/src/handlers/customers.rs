//! Customer handlers with multi-tenant support.
//!
//! All operations are scoped to the tenant (app_id, org_id) from the
//! request context.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::DateTime;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{ChurnCustomerRequest, CreateCustomerRequest, CustomerResponse, ListQuery, ListResponse},
    middleware::TenantContext,
    models::{Customer, CustomerStatus},
    AppState,
};

/// Create a new customer within the tenant's scope.
pub async fn create_customer(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    let status = payload.status.unwrap_or(CustomerStatus::Active);
    if status == CustomerStatus::Churned {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Churned customers are created through the churn transition"
        )));
    }

    let now = DateTime::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        app_id: tenant.app_id.clone(),
        org_id: tenant.org_id.clone(),
        name: payload.name,
        email: payload.email,
        status,
        plan_id: payload.plan_id,
        monthly_amount: payload.monthly_amount.unwrap_or(0.0),
        acquisition_cost: payload.acquisition_cost,
        subscribed_at: DateTime::from_chrono(payload.subscribed_at),
        churned_at: None,
        created_at: now,
        updated_at: now,
    };

    tracing::info!(
        customer_id = %customer.id,
        app_id = %tenant.app_id,
        org_id = %tenant.org_id,
        "Creating customer"
    );

    state.repository.create_customer(customer.clone()).await?;

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

/// Get a customer by ID within the tenant's scope.
pub async fn get_customer(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state
        .repository
        .get_customer_in_tenant(&tenant.app_id, &tenant.org_id, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Json(CustomerResponse::from(customer)))
}

/// List customers within the tenant's scope.
pub async fn list_customers(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<CustomerResponse>>, AppError> {
    let (customers, total) = state
        .repository
        .list_customers_in_tenant(
            &tenant.app_id,
            &tenant.org_id,
            None,
            query.limit.clamp(1, 100),
            query.offset,
        )
        .await?;

    Ok(Json(ListResponse {
        items: customers.into_iter().map(CustomerResponse::from).collect(),
        total,
    }))
}

/// Transition a customer to churned within the tenant's scope.
///
/// Sets `status` and `churned_at` in one update so the model invariant
/// (churn date iff churned) holds.
pub async fn churn_customer(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<ChurnCustomerRequest>,
) -> Result<StatusCode, AppError> {
    let customer = state
        .repository
        .get_customer_in_tenant(&tenant.app_id, &tenant.org_id, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    if customer.status == CustomerStatus::Churned {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Customer is already churned"
        )));
    }

    tracing::info!(
        customer_id = %customer_id,
        app_id = %tenant.app_id,
        org_id = %tenant.org_id,
        churned_at = %payload.churned_at,
        "Churning customer"
    );

    state
        .repository
        .mark_customer_churned(
            &tenant.app_id,
            &tenant.org_id,
            customer_id,
            payload.churned_at,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
