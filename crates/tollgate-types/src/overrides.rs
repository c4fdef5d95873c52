//! Per-tenant overrides

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ActorId, EntitlementName, OverrideValue, TenantId};

/// A tenant-specific value replacing one tier default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: EntitlementName,
    pub value: OverrideValue,
    /// Who last set this override
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Override as exposed to API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideView {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub value: String,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Override> for OverrideView {
    fn from(o: &Override) -> Self {
        Self {
            id: o.id,
            tenant_id: o.tenant_id,
            name: o.name.to_string(),
            value: o.value.to_stored(),
            created_by: o.created_by,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}
