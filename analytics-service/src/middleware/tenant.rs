//! Tenant context middleware for multi-tenancy support.
//!
//! Extracts the owning tenant (app_id, org_id) from request headers set
//! by the BFF after authenticating the user. Every repository query and
//! every metric computation is scoped by this pair; an unscoped query is
//! a defect.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

/// Tenant context extracted from request headers.
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// Application ID (maps to a registered client)
    pub app_id: String,
    /// Organization ID within the application
    pub org_id: String,
}

impl TenantContext {
    pub fn new(app_id: String, org_id: String) -> Self {
        Self { app_id, org_id }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_id = parts
            .headers
            .get("X-App-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-App-ID header (required from BFF)"
                ))
            })?;

        let org_id = parts
            .headers
            .get("X-Org-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-Org-ID header (required from BFF)"
                ))
            })?;

        // Add to tracing span for observability
        let span = tracing::Span::current();
        span.record("app_id", app_id);
        span.record("org_id", org_id);

        Ok(TenantContext::new(app_id.to_string(), org_id.to_string()))
    }
}
