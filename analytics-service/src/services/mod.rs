pub mod cache;
pub mod engine;
pub mod metrics;
pub mod repository;

pub use cache::{CacheKey, MetricsCache};
pub use engine::MetricsEngine;
pub use metrics::get_metrics;
pub use repository::AnalyticsRepository;
