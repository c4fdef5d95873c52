//! Audit log writer

use std::sync::Arc;

use tollgate_db::{AuditRepository, CreateAuditEntry};
use tollgate_types::{ActorId, AuditAction, AuditDiff, AuditEntry, TenantId};
use uuid::Uuid;

use crate::{metrics, EngineError};

/// Appends audit entries for committed administrative mutations
pub struct AuditLog<A: AuditRepository> {
    repo: Arc<A>,
}

impl<A: AuditRepository> Clone for AuditLog<A> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<A: AuditRepository> AuditLog<A> {
    pub fn new(repo: Arc<A>) -> Self {
        Self { repo }
    }

    /// Append an entry after its mutation committed.
    ///
    /// The mutation already happened, so a failed append is logged and
    /// counted rather than returned.
    pub async fn record(
        &self,
        actor: ActorId,
        tenant_id: Option<TenantId>,
        action: AuditAction,
        diff: AuditDiff,
    ) -> Option<AuditEntry> {
        let entry = CreateAuditEntry {
            id: Uuid::new_v4(),
            actor_id: actor.0,
            tenant_id: tenant_id.map(|t| t.0),
            action: action.as_str().to_string(),
            diff: serde_json::json!({ "before": diff.before, "after": diff.after }),
        };

        match self.repo.append(entry).await {
            Ok(row) => Some(row.to_entry()),
            Err(err) => {
                tracing::error!(
                    %actor,
                    tenant_id = ?tenant_id,
                    %action,
                    error = %err,
                    "Failed to write audit entry"
                );
                metrics::record_audit_failure(action.as_str());
                None
            }
        }
    }

    /// Most recent entries for a tenant, newest first
    pub async fn for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, EngineError> {
        let rows = self
            .repo
            .find_by_tenant_id(tenant_id.0, i64::from(limit))
            .await?;
        Ok(rows.iter().map(|row| row.to_entry()).collect())
    }
}
