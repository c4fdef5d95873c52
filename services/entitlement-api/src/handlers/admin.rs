//! Superadmin handlers - subscriptions, overrides and the audit log

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tollgate_core::{EngineError, UpdateSubscription};
use tollgate_types::{AuditEntry, OverrideView, Subscription, TenantId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::SuperAdmin;
use crate::handlers::shared::{parse_subscription_id, parse_tenant_id, timed};
use crate::state::AppState;

/// Audit entries returned when `limit` is not given
const DEFAULT_AUDIT_LIMIT: u32 = 50;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub tenant_id: TenantId,
    pub tier: String,
    pub trial_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    /// `true`/`false` for features, a count or `"unlimited"` for limits
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct RemoveOverrideResponse {
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u32>,
}

/// Text form of a JSON override value, as the engine parses it
fn override_value_text(value: &serde_json::Value) -> Result<String, ApiError> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(ApiError::BadRequest(format!(
            "Override value must be a string, boolean or number, got {other}"
        ))),
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// POST /api/v1/admin/subscriptions
#[instrument(skip(state, req), fields(actor_id = %admin.actor, tenant_id = %req.tenant_id))]
pub async fn create_subscription(
    State(state): State<AppState>,
    admin: SuperAdmin,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let start = Instant::now();

    let result = state
        .admin
        .create_subscription(admin.actor, req.tenant_id, &req.tier, req.trial_expires_at)
        .await
        .map(|sub| (StatusCode::CREATED, Json(sub)))
        .map_err(ApiError::from);

    timed("create_subscription", start, result)
}

/// PATCH /api/v1/admin/subscriptions/{id}
#[instrument(skip(state, update), fields(actor_id = %admin.actor))]
pub async fn update_subscription(
    State(state): State<AppState>,
    admin: SuperAdmin,
    Path(id): Path<String>,
    Json(update): Json<UpdateSubscription>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();

    let result = async {
        let id = parse_subscription_id(&id)?;
        let sub = state.admin.update_subscription(admin.actor, id, update).await?;
        Ok::<_, ApiError>(Json(sub))
    }
    .await;

    timed("update_subscription", start, result)
}

/// POST /api/v1/admin/subscriptions/{id}/reactivate
#[instrument(skip(state), fields(actor_id = %admin.actor))]
pub async fn reactivate_subscription(
    State(state): State<AppState>,
    admin: SuperAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();

    let result = async {
        let id = parse_subscription_id(&id)?;
        let sub = state.admin.reactivate_subscription(admin.actor, id).await?;
        Ok::<_, ApiError>(Json(sub))
    }
    .await;

    timed("reactivate_subscription", start, result)
}

/// GET /api/v1/admin/tenants/{tenant_id}/subscription
#[instrument(skip(state, _admin))]
pub async fn get_subscription(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let tenant_id = parse_tenant_id(&tenant_id)?;
    let sub = state
        .admin
        .get_subscription(&tenant_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("subscription for tenant {tenant_id}")))?;
    Ok(Json(sub))
}

// ============================================================================
// Overrides
// ============================================================================

/// PUT /api/v1/admin/tenants/{tenant_id}/overrides/{name}
#[instrument(skip(state, req), fields(actor_id = %admin.actor))]
pub async fn set_override(
    State(state): State<AppState>,
    admin: SuperAdmin,
    Path((tenant_id, name)): Path<(String, String)>,
    Json(req): Json<SetOverrideRequest>,
) -> ApiResult<Json<OverrideView>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let value = override_value_text(&req.value)?;
        let stored = state
            .admin
            .set_override(admin.actor, tenant_id, &name, &value)
            .await?;
        Ok::<_, ApiError>(Json(OverrideView::from(&stored)))
    }
    .await;

    timed("set_override", start, result)
}

/// DELETE /api/v1/admin/tenants/{tenant_id}/overrides/{name}
#[instrument(skip(state), fields(actor_id = %admin.actor))]
pub async fn remove_override(
    State(state): State<AppState>,
    admin: SuperAdmin,
    Path((tenant_id, name)): Path<(String, String)>,
) -> ApiResult<Json<RemoveOverrideResponse>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let removed = state
            .admin
            .remove_override(admin.actor, tenant_id, &name)
            .await?;
        Ok::<_, ApiError>(Json(RemoveOverrideResponse { removed }))
    }
    .await;

    timed("remove_override", start, result)
}

/// GET /api/v1/admin/tenants/{tenant_id}/overrides
#[instrument(skip(state, _admin))]
pub async fn list_overrides(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<Vec<OverrideView>>> {
    let tenant_id = parse_tenant_id(&tenant_id)?;
    let overrides = state.admin.list_overrides(&tenant_id).await?;
    Ok(Json(overrides))
}

// ============================================================================
// Audit
// ============================================================================

/// GET /api/v1/admin/tenants/{tenant_id}/audit?limit=N
#[instrument(skip(state, _admin))]
pub async fn get_audit_log(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    Path(tenant_id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    let tenant_id = parse_tenant_id(&tenant_id)?;
    let entries = state
        .admin
        .audit_log(&tenant_id, query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
        .await?;
    Ok(Json(entries))
}
