//! Payment model.
//!
//! Payments are not consumed by the metric formulas; they are stored for
//! downstream revenue reporting.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Payment document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub app_id: String,
    pub org_id: String,
    pub customer_id: Uuid,
    pub amount: f64,
    pub refund_amount: f64,
    pub status: PaymentStatus,
    pub paid_at: DateTime,
    pub created_at: DateTime,
}

impl Payment {
    pub fn net_amount(&self) -> f64 {
        self.amount - self.refund_amount
    }
}
