//! Axum extractors for the calling actor
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! actor as `x-actor-id` and its role as `x-actor-role`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tollgate_types::ActorId;

use crate::error::ApiError;

/// Header carrying the acting user's ID
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the acting user's role
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Role that bypasses entitlement checks and may administer subscriptions
pub const SUPERADMIN_ROLE: &str = "superadmin";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_superadmin(parts: &Parts) -> bool {
    header(parts, ACTOR_ROLE_HEADER).is_some_and(|role| role.trim() == SUPERADMIN_ROLE)
}

/// Caller of a read endpoint. Never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub privileged: bool,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            privileged: is_superadmin(parts),
        })
    }
}

/// Superadmin actor, required by every admin endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperAdmin {
    pub actor: ActorId,
}

impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = header(parts, ACTOR_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_ID_HEADER} header")))?;

        let actor = ActorId::parse(raw.trim())
            .map_err(|_| ApiError::Unauthorized(format!("invalid {ACTOR_ID_HEADER} header")))?;

        if !is_superadmin(parts) {
            tracing::warn!(%actor, "Admin request from non-superadmin actor");
            return Err(ApiError::Forbidden("superadmin role required".to_string()));
        }

        Ok(Self { actor })
    }
}
