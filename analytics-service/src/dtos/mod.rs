use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BillingCycle, Customer, CustomerStatus, Payment, PaymentStatus, Plan};

fn default_limit() -> i64 {
    50
}

fn default_months() -> u32 {
    12
}

/// Pagination parameters shared by the list endpoints.
#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

/// Reference date for a single-metric calculation. Required: there is no
/// implicit "today" anywhere in the engine.
#[derive(Debug, Deserialize)]
pub struct MetricQuery {
    pub date: NaiveDate,
}

/// Reference date plus series length for the historical endpoints.
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub date: NaiveDate,
    #[serde(default = "default_months")]
    pub months: u32,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    /// Defaults to `active`; `churned` is rejected here — churn goes
    /// through the dedicated transition endpoint.
    pub status: Option<CustomerStatus>,
    pub plan_id: Option<Uuid>,
    pub monthly_amount: Option<f64>,
    pub acquisition_cost: Option<f64>,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ChurnCustomerRequest {
    pub churned_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: CustomerStatus,
    pub plan_id: Option<Uuid>,
    pub monthly_amount: f64,
    pub acquisition_cost: Option<f64>,
    pub subscribed_at: DateTime<Utc>,
    pub churned_at: Option<DateTime<Utc>>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            status: customer.status,
            plan_id: customer.plan_id,
            monthly_amount: customer.monthly_amount,
            acquisition_cost: customer.acquisition_cost,
            subscribed_at: customer.subscribed_at.to_chrono(),
            churned_at: customer.churned_at.map(|d| d.to_chrono()),
        }
    }
}

// =============================================================================
// Plans
// =============================================================================

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
}

#[derive(Serialize, Deserialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub monthly_price: f64,
    pub is_active: bool,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        let monthly_price = plan.normalized_monthly_price();
        Self {
            id: plan.id,
            name: plan.name,
            price: plan.price,
            billing_cycle: plan.billing_cycle,
            monthly_price,
            is_active: plan.is_active,
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub customer_id: Uuid,
    pub amount: f64,
    pub refund_amount: Option<f64>,
    pub status: Option<PaymentStatus>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    pub refund_amount: f64,
    pub net_amount: f64,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        let net_amount = payment.net_amount();
        Self {
            id: payment.id,
            customer_id: payment.customer_id,
            amount: payment.amount,
            refund_amount: payment.refund_amount,
            net_amount,
            status: payment.status,
            paid_at: payment.paid_at.to_chrono(),
        }
    }
}
