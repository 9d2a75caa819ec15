//! Subscription plan model.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Billing cycle of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }

    /// Months covered by one billed period.
    pub fn months(&self) -> f64 {
        match self {
            BillingCycle::Monthly => 1.0,
            BillingCycle::Quarterly => 3.0,
            BillingCycle::Yearly => 12.0,
        }
    }
}

/// Subscription plan document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Plan {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub app_id: String,
    pub org_id: String,
    pub name: String,
    /// Price per billing cycle.
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub is_active: bool,
    pub created_at: DateTime,
}

impl Plan {
    /// Price normalized to one month.
    pub fn normalized_monthly_price(&self) -> f64 {
        self.price / self.billing_cycle.months()
    }
}
