//! Shared handler utilities

use std::time::Instant;

use tollgate_types::{SubscriptionId, TenantId};

use crate::error::ApiError;

/// Histogram recording per-operation handler latency
pub const OPERATION_DURATION_SECONDS: &str = "entitlement_api_operation_duration_seconds";

// ============================================================================
// Path Parsing
// ============================================================================

pub fn parse_tenant_id(raw: &str) -> Result<TenantId, ApiError> {
    TenantId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid tenant_id".into()))
}

pub fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, ApiError> {
    SubscriptionId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid subscription id".into()))
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record handler duration with operation and result labels
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        OPERATION_DURATION_SECONDS,
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the duration of `result` and pass it through
pub fn timed<T>(operation: &'static str, start: Instant, result: Result<T, ApiError>) -> Result<T, ApiError> {
    record_op_duration(operation, start, result.is_ok());
    result
}

// ============================================================================
// Tests
// ============================================================================
