//! Customer model.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription lifecycle state of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Trial,
    Churned,
    Suspended,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Trial => "trial",
            CustomerStatus::Churned => "churned",
            CustomerStatus::Suspended => "suspended",
        }
    }
}

/// Customer document.
///
/// Invariant: `churned_at` is set if and only if `status` is `Churned`.
/// The churn transition writes both fields in a single update, so no
/// other write path can break the pairing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub app_id: String,
    pub org_id: String,
    pub name: String,
    pub email: String,
    pub status: CustomerStatus,
    pub plan_id: Option<Uuid>,
    /// Fallback monthly revenue, used when no plan document resolves.
    pub monthly_amount: f64,
    pub acquisition_cost: Option<f64>,
    pub subscribed_at: DateTime,
    pub churned_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
