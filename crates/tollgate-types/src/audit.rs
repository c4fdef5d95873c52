//! Audit log types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ActorId, TenantId};

/// Administrative actions recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "subscription.create")]
    SubscriptionCreate,
    #[serde(rename = "subscription.update")]
    SubscriptionUpdate,
    #[serde(rename = "subscription.reactivate")]
    SubscriptionReactivate,
    #[serde(rename = "override.set")]
    OverrideSet,
    #[serde(rename = "override.remove")]
    OverrideRemove,
}

impl AuditAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionCreate => "subscription.create",
            Self::SubscriptionUpdate => "subscription.update",
            Self::SubscriptionReactivate => "subscription.reactivate",
            Self::OverrideSet => "override.set",
            Self::OverrideRemove => "override.remove",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before/after state of the mutated record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDiff {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

impl AuditDiff {
    pub fn new(before: serde_json::Value, after: serde_json::Value) -> Self {
        Self { before, after }
    }
}

/// Immutable audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: ActorId,
    /// Affected tenant, `None` for system-wide actions
    pub tenant_id: Option<TenantId>,
    /// Action name, e.g. `override.set`
    pub action: String,
    pub diff: AuditDiff,
    pub created_at: DateTime<Utc>,
}
