//! Administrative mutations - subscriptions and overrides
//!
//! Every mutation is one store transaction. Only after it commits is the
//! tenant's cached snapshot invalidated and an audit entry appended; a store
//! failure leaves neither behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tollgate_db::{
    AuditRepository, CreateSubscription, DbError, OverrideRepository, OverrideRow,
    SubscriptionChanges, SubscriptionRepository, UpsertOverride,
};
use tollgate_types::{
    ActorId, AuditAction, AuditDiff, AuditEntry, EntitlementName, Override, OverrideView,
    Subscription, SubscriptionId, SubscriptionStatus, TenantId, Tier,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{AuditLog, EngineError, EntitlementService};

/// Upper bound on audit entries returned by one query
pub const MAX_AUDIT_ENTRIES: u32 = 500;

/// Partial subscription update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateSubscription {
    pub tier: Option<String>,
    pub status: Option<String>,
    /// `Some(None)` clears the trial expiry
    #[serde(default, deserialize_with = "double_option")]
    pub trial_expires_at: Option<Option<DateTime<Utc>>>,
}

/// Distinguish an explicit `null` from an absent field
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

/// Admin mutation service
pub struct AdminService<S, O, A>
where
    S: SubscriptionRepository,
    O: OverrideRepository,
    A: AuditRepository,
{
    subscriptions: Arc<S>,
    overrides: Arc<O>,
    audit: AuditLog<A>,
    entitlements: Arc<EntitlementService<S, O>>,
}

impl<S, O, A> AdminService<S, O, A>
where
    S: SubscriptionRepository,
    O: OverrideRepository,
    A: AuditRepository,
{
    /// Create a new admin service sharing the read service's repositories
    pub fn new(
        subscriptions: Arc<S>,
        overrides: Arc<O>,
        audit: Arc<A>,
        entitlements: Arc<EntitlementService<S, O>>,
    ) -> Self {
        Self {
            subscriptions,
            overrides,
            audit: AuditLog::new(audit),
            entitlements,
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Create a tenant's subscription with status `active`
    #[instrument(skip(self))]
    pub async fn create_subscription(
        &self,
        actor: ActorId,
        tenant_id: TenantId,
        tier: &str,
        trial_expires_at: Option<DateTime<Utc>>,
    ) -> Result<Subscription, EngineError> {
        let tier = self.parse_tier(tier)?;

        let row = self
            .subscriptions
            .create(CreateSubscription {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.0,
                tier: tier.as_str().to_string(),
                status: SubscriptionStatus::Active.as_str().to_string(),
                trial_expires_at,
            })
            .await
            .map_err(|err| match err {
                DbError::Conflict(_) => {
                    EngineError::AlreadyExists(format!("subscription for tenant {tenant_id}"))
                }
                other => other.into(),
            })?;

        tracing::info!(subscription_id = %row.id, %tier, "Subscription created");

        self.after_commit(
            actor,
            tenant_id,
            AuditAction::SubscriptionCreate,
            AuditDiff::new(serde_json::Value::Null, row.audit_json()),
        )
        .await;

        Ok(row.to_subscription()?)
    }

    /// Apply a partial update
    #[instrument(skip(self))]
    pub async fn update_subscription(
        &self,
        actor: ActorId,
        id: SubscriptionId,
        update: UpdateSubscription,
    ) -> Result<Subscription, EngineError> {
        let tier = update
            .tier
            .as_deref()
            .map(|tier| self.parse_tier(tier))
            .transpose()?;
        let status = update
            .status
            .as_deref()
            .map(str::parse::<SubscriptionStatus>)
            .transpose()?;

        let changes = SubscriptionChanges {
            tier: tier.map(|t| t.as_str().to_string()),
            status: status.map(|s| s.as_str().to_string()),
            trial_expires_at: update.trial_expires_at,
            clear_trial_expired_before: None,
        };

        self.apply_subscription_changes(actor, id, changes, AuditAction::SubscriptionUpdate)
            .await
    }

    /// Force status to `active`, clearing a trial expiry already in the past
    #[instrument(skip(self))]
    pub async fn reactivate_subscription(
        &self,
        actor: ActorId,
        id: SubscriptionId,
    ) -> Result<Subscription, EngineError> {
        let changes = SubscriptionChanges {
            status: Some(SubscriptionStatus::Active.as_str().to_string()),
            clear_trial_expired_before: Some(Utc::now()),
            ..Default::default()
        };

        self.apply_subscription_changes(actor, id, changes, AuditAction::SubscriptionReactivate)
            .await
    }

    /// A tenant's subscription, if any
    pub async fn get_subscription(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Subscription>, EngineError> {
        let row = self.subscriptions.find_by_tenant_id(tenant_id.0).await?;
        Ok(row.map(|row| row.to_subscription()).transpose()?)
    }

    async fn apply_subscription_changes(
        &self,
        actor: ActorId,
        id: SubscriptionId,
        changes: SubscriptionChanges,
        action: AuditAction,
    ) -> Result<Subscription, EngineError> {
        let change = self
            .subscriptions
            .update(id.0, changes)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("subscription {id}")))?;

        let tenant_id = TenantId(change.after.tenant_id);
        tracing::info!(%tenant_id, status = %change.after.status, %action, "Subscription changed");

        self.after_commit(
            actor,
            tenant_id,
            action,
            AuditDiff::new(change.before.audit_json(), change.after.audit_json()),
        )
        .await;

        Ok(change.after.to_subscription()?)
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    /// Insert or replace the override for `name`
    #[instrument(skip(self))]
    pub async fn set_override(
        &self,
        actor: ActorId,
        tenant_id: TenantId,
        name: &str,
        value: &str,
    ) -> Result<Override, EngineError> {
        let name: EntitlementName = name.parse()?;
        let value = name.parse_value(value)?;

        let upserted = self
            .overrides
            .upsert(UpsertOverride {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.0,
                name: name.to_string(),
                value: value.to_stored(),
                created_by: actor.0,
            })
            .await
            .map_err(|err| match err {
                DbError::NotFound => {
                    EngineError::NotFound(format!("subscription for tenant {tenant_id}"))
                }
                other => other.into(),
            })?;

        tracing::info!(%name, value = %value.to_stored(), created = upserted.before.is_none(), "Override set");

        let before = upserted
            .before
            .as_ref()
            .map_or(serde_json::Value::Null, OverrideRow::audit_json);

        self.after_commit(
            actor,
            tenant_id,
            AuditAction::OverrideSet,
            AuditDiff::new(before, upserted.after.audit_json()),
        )
        .await;

        Ok(upserted.after.to_override()?)
    }

    /// Remove the override for `name`. Returns whether one existed.
    ///
    /// Matches the stored name as-is, so rows outside the allow-list that
    /// `list_overrides` shows can still be removed.
    #[instrument(skip(self))]
    pub async fn remove_override(
        &self,
        actor: ActorId,
        tenant_id: TenantId,
        name: &str,
    ) -> Result<bool, EngineError> {
        let Some(removed) = self.overrides.delete(tenant_id.0, name).await? else {
            tracing::debug!(%name, "No override to remove");
            return Ok(false);
        };

        tracing::info!(%name, "Override removed");

        self.after_commit(
            actor,
            tenant_id,
            AuditAction::OverrideRemove,
            AuditDiff::new(removed.audit_json(), serde_json::Value::Null),
        )
        .await;

        Ok(true)
    }

    /// Every stored override for a tenant, including rows the resolver skips
    pub async fn list_overrides(&self, tenant_id: &TenantId) -> Result<Vec<OverrideView>, EngineError> {
        let rows = self.overrides.find_by_tenant_id(tenant_id.0).await?;
        Ok(rows.iter().map(override_view).collect())
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Most recent audit entries for a tenant, newest first
    pub async fn audit_log(
        &self,
        tenant_id: &TenantId,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, EngineError> {
        self.audit
            .for_tenant(tenant_id, limit.clamp(1, MAX_AUDIT_ENTRIES))
            .await
    }

    /// Post-commit steps: invalidate, then audit. Neither can fail the mutation.
    async fn after_commit(
        &self,
        actor: ActorId,
        tenant_id: TenantId,
        action: AuditAction,
        diff: AuditDiff,
    ) {
        self.entitlements.invalidate_cache(&tenant_id).await;
        self.audit.record(actor, Some(tenant_id), action, diff).await;
    }

    fn parse_tier(&self, raw: &str) -> Result<Tier, EngineError> {
        let tier: Tier = raw.parse()?;
        if !self.entitlements.resolver().catalog().contains(tier) {
            return Err(EngineError::InvalidTier(raw.to_string()));
        }
        Ok(tier)
    }
}

fn override_view(row: &OverrideRow) -> OverrideView {
    OverrideView {
        id: row.id,
        tenant_id: TenantId(row.tenant_id),
        name: row.name.clone(),
        value: row.value.clone(),
        created_by: ActorId(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
