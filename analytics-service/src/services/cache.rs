//! Short-lived result cache for metric computations.
//!
//! Process-wide, shared across concurrent requests through `DashMap`.
//! Entries go stale after a fixed TTL and are superseded in place on the
//! next computation; nothing else evicts them. There is no per-key
//! locking: concurrent callers of the same stale key may each recompute,
//! which is tolerated because every computation is a pure read of the
//! persistence layer.

use crate::models::{MetricKind, MetricValue};
use crate::services::metrics::{record_cache_hit, record_cache_miss};
use dashmap::DashMap;
use service_core::error::AppError;
use std::future::Future;
use std::time::{Duration, Instant};

/// Structured cache key: metric family, tenant and calendar-month period.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub metric: MetricKind,
    pub app_id: String,
    pub org_id: String,
    /// (year, month) of the reference date.
    pub period: (i32, u32),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: MetricValue,
    computed_at: Instant,
}

#[derive(Debug)]
pub struct MetricsCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached value for `key` when fresh; otherwise await
    /// `compute`, store the result and return it. Errors from `compute`
    /// propagate and are never cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<MetricValue, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MetricValue, AppError>>,
    {
        if let Some(entry) = self.entries.get(&key) {
            if entry.computed_at.elapsed() < self.ttl {
                record_cache_hit(key.metric.as_str());
                return Ok(entry.value);
            }
        }

        record_cache_miss(key.metric.as_str());
        let value = compute().await?;
        self.entries.insert(
            key,
            CacheEntry {
                value,
                computed_at: Instant::now(),
            },
        );

        Ok(value)
    }

    /// Drop every entry, for all tenants. Used by the manual refresh
    /// endpoint.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
