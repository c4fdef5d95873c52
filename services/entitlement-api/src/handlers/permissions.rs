//! Entitlement read handlers

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tollgate_core::{Admission, DeviceAdmission, EngineError};
use tollgate_types::{Limit, LimitValue, Permissions, TenantId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Caller;
use crate::handlers::shared::{parse_tenant_id, timed};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FeatureCheckResponse {
    pub tenant_id: TenantId,
    pub feature: String,
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct LimitResponse {
    pub tenant_id: TenantId,
    pub limit: Limit,
    pub value: LimitValue,
    pub unlimited: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeviceAdmissionQuery {
    pub active_devices: u64,
}

#[derive(Debug, Serialize)]
pub struct DeviceAdmissionResponse {
    pub tenant_id: TenantId,
    /// `admitted`, plus `limit` and `active_devices` when denied
    #[serde(flatten)]
    pub detail: serde_json::Value,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/tenants/{tenant_id}/permissions
#[instrument(skip(state))]
pub async fn get_permissions(
    State(state): State<AppState>,
    caller: Caller,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<Permissions>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let permissions = state
            .entitlements
            .get_permissions_as(&tenant_id, caller.privileged)
            .await?;
        Ok::<_, ApiError>(Json(permissions))
    }
    .await;

    timed("get_permissions", start, result)
}

/// GET /api/v1/tenants/{tenant_id}/features/{feature}
///
/// Unknown feature names answer `granted: false`.
#[instrument(skip(state))]
pub async fn check_feature(
    State(state): State<AppState>,
    caller: Caller,
    Path((tenant_id, feature)): Path<(String, String)>,
) -> ApiResult<Json<FeatureCheckResponse>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let granted = state
            .entitlements
            .check_feature(&tenant_id, &feature, caller.privileged)
            .await?;
        Ok::<_, ApiError>(Json(FeatureCheckResponse {
            tenant_id,
            feature,
            granted,
        }))
    }
    .await;

    timed("check_feature", start, result)
}

/// GET /api/v1/tenants/{tenant_id}/limits/{limit}
#[instrument(skip(state))]
pub async fn get_limit(
    State(state): State<AppState>,
    caller: Caller,
    Path((tenant_id, limit)): Path<(String, String)>,
) -> ApiResult<Json<LimitResponse>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let limit: Limit = limit
            .parse()
            .map_err(|_| EngineError::UnknownFeatureName(limit.clone()))?;

        let value = state
            .entitlements
            .effective_limit(&tenant_id, limit, caller.privileged)
            .await?;

        Ok::<_, ApiError>(Json(LimitResponse {
            tenant_id,
            limit,
            value,
            unlimited: value.is_unlimited(),
        }))
    }
    .await;

    timed("get_limit", start, result)
}

/// GET /api/v1/tenants/{tenant_id}/devices/admission?active_devices=N
#[instrument(skip(state))]
pub async fn check_device_admission(
    State(state): State<AppState>,
    caller: Caller,
    Path(tenant_id): Path<String>,
    Query(query): Query<DeviceAdmissionQuery>,
) -> ApiResult<Json<DeviceAdmissionResponse>> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        let limit = state
            .entitlements
            .effective_limit(&tenant_id, Limit::MaxDevices, caller.privileged)
            .await?;

        let admission = DeviceAdmission::check(limit, query.active_devices);
        if let Admission::Deny { limit, active } = admission {
            tracing::info!(%tenant_id, limit, active, "Device admission denied");
        }

        Ok::<_, ApiError>(Json(DeviceAdmissionResponse {
            tenant_id,
            detail: admission.to_json(),
        }))
    }
    .await;

    timed("check_device_admission", start, result)
}

/// POST /api/v1/tenants/{tenant_id}/cache/invalidate
#[instrument(skip(state))]
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let start = Instant::now();

    let result = async {
        let tenant_id = parse_tenant_id(&tenant_id)?;
        state.entitlements.invalidate_cache(&tenant_id).await;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    timed("invalidate_cache", start, result)
}
