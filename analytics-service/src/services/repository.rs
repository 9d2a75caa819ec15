//! Database access for analytics-service.
//!
//! Every query is scoped to the tenant (app_id, org_id); an unscoped
//! query is a defect.

use crate::models::{Customer, CustomerStatus, Payment, Plan};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;

fn bson_date(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(value)
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    customers: Collection<Customer>,
    plans: Collection<Plan>,
    payments: Collection<Payment>,
}

impl AnalyticsRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            customers: db.collection("customers"),
            plans: db.collection("plans"),
            payments: db.collection("payments"),
        }
    }

    /// Initialize database indexes for tenant-scoped queries.
    pub async fn init_indexes(&self) -> Result<(), AppError> {
        // Compound index on (app_id, org_id, status) for metric filters
        let status_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "org_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_customer_status_idx".to_string())
                    .build(),
            )
            .build();

        // Compound index on (app_id, org_id, subscribed_at) for range scans
        let subscribed_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "org_id": 1, "subscribed_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_customer_subscribed_idx".to_string())
                    .build(),
            )
            .build();

        // Compound index on (app_id, org_id, churned_at) for churn ranges
        let churned_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "org_id": 1, "churned_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_customer_churned_idx".to_string())
                    .build(),
            )
            .build();

        self.customers
            .create_indexes([status_index, subscribed_index, churned_index], None)
            .await?;

        let tenant_plan_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "org_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_plan_idx".to_string())
                    .build(),
            )
            .build();

        self.plans.create_indexes([tenant_plan_index], None).await?;

        let tenant_payment_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "org_id": 1, "customer_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_payment_customer_idx".to_string())
                    .build(),
            )
            .build();

        self.payments
            .create_indexes([tenant_payment_index], None)
            .await?;

        tracing::info!("Analytics service indexes initialized");
        Ok(())
    }

    // =========================================================================
    // Customer Operations
    // =========================================================================

    pub async fn create_customer(&self, customer: Customer) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        self.customers.insert_one(customer, None).await?;

        timer.observe_duration();
        Ok(())
    }

    /// Get a customer by ID within a specific tenant.
    pub async fn get_customer_in_tenant(
        &self,
        app_id: &str,
        org_id: &str,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let filter = doc! {
            "_id": id.to_string(),
            "app_id": app_id,
            "org_id": org_id
        };
        let customer = self.customers.find_one(filter, None).await?;

        timer.observe_duration();
        Ok(customer)
    }

    /// List customers within a tenant with an optional status filter.
    pub async fn list_customers_in_tenant(
        &self,
        app_id: &str,
        org_id: &str,
        status_filter: Option<CustomerStatus>,
        limit: i64,
        offset: u64,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let mut filter = doc! {
            "app_id": app_id,
            "org_id": org_id
        };
        if let Some(status) = status_filter {
            filter.insert("status", status.as_str());
        }

        let total_count = self
            .customers
            .count_documents(filter.clone(), None)
            .await? as i64;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(offset)
            .limit(limit)
            .build();

        let cursor = self.customers.find(filter, Some(options)).await?;
        let customers: Vec<Customer> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok((customers, total_count))
    }

    /// Transition a customer to churned, setting `churned_at` in the same
    /// update so the status/churn-date pairing holds.
    pub async fn mark_customer_churned(
        &self,
        app_id: &str,
        org_id: &str,
        id: Uuid,
        churned_at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_customer_churned"])
            .start_timer();

        let filter = doc! {
            "_id": id.to_string(),
            "app_id": app_id,
            "org_id": org_id
        };
        let update = doc! {
            "$set": {
                "status": CustomerStatus::Churned.as_str(),
                "churned_at": bson_date(churned_at),
                "updated_at": bson::DateTime::now()
            }
        };
        let result = self.customers.update_one(filter, update, None).await?;

        timer.observe_duration();
        Ok(result.modified_count)
    }

    // =========================================================================
    // Metric Queries
    // =========================================================================

    /// Active customers whose subscription started strictly before `cutoff`.
    pub async fn list_active_subscribed_before(
        &self,
        app_id: &str,
        org_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_active_subscribed_before"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "status": CustomerStatus::Active.as_str(),
            "subscribed_at": { "$lt": bson_date(cutoff) }
        };
        let cursor = self.customers.find(filter, None).await?;
        let customers: Vec<Customer> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok(customers)
    }

    /// All currently active customers of a tenant.
    pub async fn list_active_customers(
        &self,
        app_id: &str,
        org_id: &str,
    ) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_active_customers"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "status": CustomerStatus::Active.as_str()
        };
        let cursor = self.customers.find(filter, None).await?;
        let customers: Vec<Customer> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok(customers)
    }

    /// Customers whose subscription started within `[from, to)`, any status.
    pub async fn list_subscribed_between(
        &self,
        app_id: &str,
        org_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_subscribed_between"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "subscribed_at": { "$gte": bson_date(from), "$lt": bson_date(to) }
        };
        let cursor = self.customers.find(filter, None).await?;
        let customers: Vec<Customer> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok(customers)
    }

    /// Count of active customers subscribed strictly before `cutoff`.
    pub async fn count_active_subscribed_before(
        &self,
        app_id: &str,
        org_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_active_subscribed_before"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "status": CustomerStatus::Active.as_str(),
            "subscribed_at": { "$lt": bson_date(cutoff) }
        };
        let count = self.customers.count_documents(filter, None).await?;

        timer.observe_duration();
        Ok(count)
    }

    /// Count of customers churned within `[from, to)`.
    pub async fn count_churned_between(
        &self,
        app_id: &str,
        org_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_churned_between"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "status": CustomerStatus::Churned.as_str(),
            "churned_at": { "$gte": bson_date(from), "$lt": bson_date(to) }
        };
        let count = self.customers.count_documents(filter, None).await?;

        timer.observe_duration();
        Ok(count)
    }

    /// Count of customers subscribed strictly before `cutoff`, any status.
    pub async fn count_subscribed_before(
        &self,
        app_id: &str,
        org_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_subscribed_before"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "subscribed_at": { "$lt": bson_date(cutoff) }
        };
        let count = self.customers.count_documents(filter, None).await?;

        timer.observe_duration();
        Ok(count)
    }

    /// Count of customers churned strictly before `cutoff`.
    pub async fn count_churned_before(
        &self,
        app_id: &str,
        org_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_churned_before"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "status": CustomerStatus::Churned.as_str(),
            "churned_at": { "$lt": bson_date(cutoff) }
        };
        let count = self.customers.count_documents(filter, None).await?;

        timer.observe_duration();
        Ok(count)
    }

    // =========================================================================
    // Plan Operations
    // =========================================================================

    pub async fn create_plan(&self, plan: Plan) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_plan"])
            .start_timer();

        self.plans.insert_one(plan, None).await?;

        timer.observe_duration();
        Ok(())
    }

    /// Get a plan by ID within a specific tenant.
    pub async fn get_plan_in_tenant(
        &self,
        app_id: &str,
        org_id: &str,
        id: Uuid,
    ) -> Result<Option<Plan>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_plan"])
            .start_timer();

        let filter = doc! {
            "_id": id.to_string(),
            "app_id": app_id,
            "org_id": org_id
        };
        let plan = self.plans.find_one(filter, None).await?;

        timer.observe_duration();
        Ok(plan)
    }

    /// List plans for a tenant.
    pub async fn list_plans_in_tenant(
        &self,
        app_id: &str,
        org_id: &str,
        limit: i64,
        offset: u64,
    ) -> Result<(Vec<Plan>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_plans"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id
        };

        let total_count = self.plans.count_documents(filter.clone(), None).await? as i64;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(offset)
            .limit(limit)
            .build();

        let cursor = self.plans.find(filter, Some(options)).await?;
        let plans: Vec<Plan> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok((plans, total_count))
    }

    /// Resolve a set of plan IDs to plan documents, keyed by ID.
    pub async fn plans_by_ids(
        &self,
        app_id: &str,
        org_id: &str,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Plan>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["plans_by_ids"])
            .start_timer();

        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id,
            "_id": { "$in": id_strings }
        };
        let cursor = self.plans.find(filter, None).await?;
        let plans: Vec<Plan> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok(plans.into_iter().map(|p| (p.id, p)).collect())
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    pub async fn create_payment(&self, payment: Payment) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_payment"])
            .start_timer();

        self.payments.insert_one(payment, None).await?;

        timer.observe_duration();
        Ok(())
    }

    /// List payments within a tenant, newest first.
    pub async fn list_payments_in_tenant(
        &self,
        app_id: &str,
        org_id: &str,
        limit: i64,
        offset: u64,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let filter = doc! {
            "app_id": app_id,
            "org_id": org_id
        };

        let total_count = self.payments.count_documents(filter.clone(), None).await? as i64;

        let options = FindOptions::builder()
            .sort(doc! { "paid_at": -1 })
            .skip(offset)
            .limit(limit)
            .build();

        let cursor = self.payments.find(filter, Some(options)).await?;
        let payments: Vec<Payment> = cursor.try_collect().await?;

        timer.observe_duration();
        Ok((payments, total_count))
    }
}
