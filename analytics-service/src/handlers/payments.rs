//! Payment handlers with multi-tenant support.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::DateTime;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{CreatePaymentRequest, ListQuery, ListResponse, PaymentResponse},
    middleware::TenantContext,
    models::{Payment, PaymentStatus},
    AppState,
};

/// Record a payment within the tenant's scope.
pub async fn create_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let payment = Payment {
        id: Uuid::new_v4(),
        app_id: tenant.app_id.clone(),
        org_id: tenant.org_id.clone(),
        customer_id: payload.customer_id,
        amount: payload.amount,
        refund_amount: payload.refund_amount.unwrap_or(0.0),
        status: payload.status.unwrap_or(PaymentStatus::Completed),
        paid_at: DateTime::from_chrono(payload.paid_at),
        created_at: DateTime::now(),
    };

    tracing::info!(
        payment_id = %payment.id,
        customer_id = %payment.customer_id,
        app_id = %tenant.app_id,
        org_id = %tenant.org_id,
        amount = payment.amount,
        "Recording payment"
    );

    state.repository.create_payment(payment.clone()).await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// List payments within the tenant's scope, newest first.
pub async fn list_payments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<PaymentResponse>>, AppError> {
    let (payments, total) = state
        .repository
        .list_payments_in_tenant(
            &tenant.app_id,
            &tenant.org_id,
            query.limit.clamp(1, 100),
            query.offset,
        )
        .await?;

    Ok(Json(ListResponse {
        items: payments.into_iter().map(PaymentResponse::from).collect(),
        total,
    }))
}
