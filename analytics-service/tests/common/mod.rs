use analytics_service::config::{CacheConfig, Config, DatabaseConfig, ServerConfig};
use analytics_service::Application;
use secrecy::Secret;
use serde_json::{json, Value};

pub const TEST_APP_ID: &str = "test-app";
pub const TEST_ORG_ID: &str = "test-org";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_name = format!("analytics_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
            },
            cache: CacheConfig { ttl_seconds: 300 },
            service_name: "analytics-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            client,
        }
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }

    // =========================================================================
    // HTTP helpers (default test tenant)
    // =========================================================================

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.post_json_as(TEST_ORG_ID, path, body).await
    }

    pub async fn post_json_as(&self, org_id: &str, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-App-ID", TEST_APP_ID)
            .header("X-Org-ID", org_id)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.get_as(TEST_ORG_ID, path).await
    }

    pub async fn get_as(&self, org_id: &str, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-App-ID", TEST_APP_ID)
            .header("X-Org-ID", org_id)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(
            response.status().is_success(),
            "GET {} failed with {}",
            path,
            response.status()
        );
        response.json().await.expect("invalid JSON response")
    }

    // =========================================================================
    // Seed helpers
    // =========================================================================

    /// Create a plan and return its ID.
    pub async fn seed_plan(&self, name: &str, price: f64, billing_cycle: &str) -> String {
        let response = self
            .post_json(
                "/plans",
                &json!({
                    "name": name,
                    "price": price,
                    "billing_cycle": billing_cycle
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "seeding plan failed");
        let body: Value = response.json().await.expect("invalid plan response");
        body["id"].as_str().expect("plan id missing").to_string()
    }

    /// Create a customer from the given payload and return its ID.
    pub async fn seed_customer(&self, payload: Value) -> String {
        let response = self.post_json("/customers", &payload).await;
        assert_eq!(response.status().as_u16(), 201, "seeding customer failed");
        let body: Value = response.json().await.expect("invalid customer response");
        body["id"].as_str().expect("customer id missing").to_string()
    }

    /// Create an active customer on a plan, subscribed at `subscribed_at`.
    pub async fn seed_plan_customer(&self, plan_id: &str, subscribed_at: &str) -> String {
        self.seed_customer(json!({
            "name": "Customer",
            "email": "customer@example.com",
            "plan_id": plan_id,
            "subscribed_at": subscribed_at
        }))
        .await
    }

    /// Transition a customer to churned.
    pub async fn churn_customer(&self, customer_id: &str, churned_at: &str) {
        let response = self
            .post_json(
                &format!("/customers/{}/churn", customer_id),
                &json!({ "churned_at": churned_at }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 204, "churning customer failed");
    }
}
