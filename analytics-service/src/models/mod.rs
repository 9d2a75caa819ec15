pub mod customer;
pub mod metrics;
pub mod payment;
pub mod plan;

pub use customer::{Customer, CustomerStatus};
pub use metrics::{
    CustomerGrowthPoint, MetricKind, MetricValue, MetricsSnapshot, MonthlyMetrics,
};
pub use payment::{Payment, PaymentStatus};
pub use plan::{BillingCycle, Plan};
