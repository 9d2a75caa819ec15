pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{AnalyticsRepository, MetricsCache, MetricsEngine};

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub repository: AnalyticsRepository,
    pub engine: MetricsEngine,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: mongodb::Database,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e.into())
            })?;
        client_options.app_name = Some("analytics-service".to_string());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        services::metrics::init_metrics();

        let repository = AnalyticsRepository::new(&db);

        // Initialize indexes for tenant-scoped queries
        repository.init_indexes().await?;

        let cache = Arc::new(MetricsCache::new(Duration::from_secs(
            config.cache.ttl_seconds,
        )));
        let engine = MetricsEngine::new(repository.clone(), cache);

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            repository,
            engine,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            // Customer endpoints (tenant-scoped)
            .route(
                "/customers",
                post(handlers::customers::create_customer).get(handlers::customers::list_customers),
            )
            .route("/customers/:id", get(handlers::customers::get_customer))
            .route(
                "/customers/:id/churn",
                post(handlers::customers::churn_customer),
            )
            // Plan endpoints (tenant-scoped)
            .route(
                "/plans",
                post(handlers::plans::create_plan).get(handlers::plans::list_plans),
            )
            .route("/plans/:id", get(handlers::plans::get_plan))
            // Payment endpoints (tenant-scoped)
            .route(
                "/payments",
                post(handlers::payments::create_payment).get(handlers::payments::list_payments),
            )
            // Analytics endpoints (tenant-scoped)
            .route("/analytics/mrr", get(handlers::analytics::mrr))
            .route("/analytics/arr", get(handlers::analytics::arr))
            .route("/analytics/churn", get(handlers::analytics::churn_rate))
            .route("/analytics/ltv", get(handlers::analytics::ltv))
            .route("/analytics/cac", get(handlers::analytics::cac))
            .route("/analytics/summary", get(handlers::analytics::summary))
            .route("/analytics/history", get(handlers::analytics::history))
            .route(
                "/analytics/customer-growth",
                get(handlers::analytics::customer_growth),
            )
            .route("/analytics/refresh", post(handlers::analytics::refresh))
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Bind the listener here so port 0 resolves to a real port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Analytics service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &mongodb::Database {
        &self.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
