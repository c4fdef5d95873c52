//! Liveness and readiness
//!
//! Readiness follows the store fault policy: when reads can be answered
//! without the store (`fail_closed`, `fail_open:<tier>`), an unreachable
//! database reports `degraded` instead of taking the instance out of rotation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tollgate_core::StoreFaultPolicy;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// `ready`, `degraded` or `unavailable`
    pub status: &'static str,
    pub database: &'static str,
    pub cache: CacheReadiness,
    pub store_fault_policy: String,
}

#[derive(Debug, Serialize)]
pub struct CacheReadiness {
    pub enabled: bool,
    pub ttl_secs: u64,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let database_up = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = ?e, "Database health check failed");
            false
        }
    };

    let cache = CacheReadiness {
        enabled: state.config.cache_enabled,
        ttl_secs: state.config.engine.cache_ttl.as_secs(),
    };
    let (status, body) = readiness(database_up, state.config.engine.store_fault_policy, cache);
    (status, Json(body))
}

fn readiness(
    database_up: bool,
    policy: StoreFaultPolicy,
    cache: CacheReadiness,
) -> (StatusCode, ReadyResponse) {
    let policy_name = match policy {
        StoreFaultPolicy::Propagate => "propagate".to_string(),
        StoreFaultPolicy::FailClosed => "fail_closed".to_string(),
        StoreFaultPolicy::FailOpen { tier } => format!("fail_open:{tier}"),
    };

    let (code, status, database) = match (database_up, policy) {
        (true, _) => (StatusCode::OK, "ready", "connected"),
        (false, StoreFaultPolicy::Propagate) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", "unreachable")
        }
        (false, _) => (StatusCode::OK, "degraded", "unreachable"),
    };

    (
        code,
        ReadyResponse {
            status,
            database,
            cache,
            store_fault_policy: policy_name,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_types::Tier;

    fn cache() -> CacheReadiness {
        CacheReadiness {
            enabled: true,
            ttl_secs: 300,
        }
    }

    #[test]
    fn test_ready_when_database_up() {
        let (code, body) = readiness(true, StoreFaultPolicy::Propagate, cache());
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert_eq!(body.database, "connected");
    }

    #[test]
    fn test_database_down_without_fallback_is_unavailable() {
        let (code, body) = readiness(false, StoreFaultPolicy::Propagate, cache());
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unavailable");
    }

    #[test]
    fn test_database_down_with_fallback_is_degraded() {
        let (code, body) = readiness(false, StoreFaultPolicy::FailClosed, cache());
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "degraded");

        let (code, body) = readiness(false, StoreFaultPolicy::FailOpen { tier: Tier::Core }, cache());
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.store_fault_policy, "fail_open:core");
    }
}
