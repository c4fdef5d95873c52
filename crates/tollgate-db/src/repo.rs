//! Repository traits
//!
//! Define async repository interfaces for database operations. Every
//! mutating method is a single transaction in the PostgreSQL
//! implementation: it either fully applies or leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// State of a record before and after a committed mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription owned by a tenant
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new subscription.
    ///
    /// Returns [`DbError::Conflict`](crate::DbError::Conflict) when the tenant
    /// already has one.
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Apply a partial update.
    ///
    /// Returns `None` when no subscription has this ID.
    async fn update(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> DbResult<Option<Change<SubscriptionRow>>>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tier: String,
    pub status: String,
    pub trial_expires_at: Option<DateTime<Utc>>,
}

/// Partial subscription update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub tier: Option<String>,
    pub status: Option<String>,
    /// `Some(None)` clears the trial expiry
    pub trial_expires_at: Option<Option<DateTime<Utc>>>,
    /// Clear a stored trial expiry that is earlier than this instant
    pub clear_trial_expired_before: Option<DateTime<Utc>>,
}

impl SubscriptionChanges {
    /// Apply these changes to a row in memory, mirroring the SQL update
    pub fn apply(&self, row: &SubscriptionRow, now: DateTime<Utc>) -> SubscriptionRow {
        let mut next = row.clone();
        if let Some(tier) = &self.tier {
            next.tier = tier.clone();
        }
        if let Some(status) = &self.status {
            next.status = status.clone();
        }
        if let Some(trial) = self.trial_expires_at {
            next.trial_expires_at = trial;
        } else if let Some(cutoff) = self.clear_trial_expired_before {
            if next.trial_expires_at.is_some_and(|expires| expires < cutoff) {
                next.trial_expires_at = None;
            }
        }
        next.updated_at = now;
        next
    }
}

/// Override repository trait
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// All overrides for a tenant, ordered by name
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Vec<OverrideRow>>;

    /// Insert or replace the override for `(tenant_id, name)`.
    ///
    /// Returns [`DbError::NotFound`](crate::DbError::NotFound) when the
    /// tenant has no subscription.
    async fn upsert(&self, input: UpsertOverride) -> DbResult<Upserted>;

    /// Delete the override for `(tenant_id, name)`, returning the removed row
    async fn delete(&self, tenant_id: Uuid, name: &str) -> DbResult<Option<OverrideRow>>;
}

/// Upsert override input
#[derive(Debug, Clone)]
pub struct UpsertOverride {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub value: String,
    pub created_by: Uuid,
}

/// Result of an override upsert
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    /// Previous row, `None` if the override was created
    pub before: Option<OverrideRow>,
    pub after: OverrideRow,
}

/// Audit repository trait (append-only)
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditRow>;

    /// Most recent entries for a tenant, newest first
    async fn find_by_tenant_id(&self, tenant_id: Uuid, limit: i64) -> DbResult<Vec<AuditRow>>;
}

/// Create audit entry input
#[derive(Debug, Clone)]
pub struct CreateAuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub action: String,
    pub diff: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(trial: Option<DateTime<Utc>>) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tier: "demo".to_string(),
            status: "expired".to_string(),
            trial_expires_at: trial,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_leaves_unset_fields() {
        let original = row(None);
        let changes = SubscriptionChanges {
            status: Some("active".to_string()),
            ..Default::default()
        };

        let next = changes.apply(&original, Utc::now());
        assert_eq!(next.status, "active");
        assert_eq!(next.tier, original.tier);
        assert_eq!(next.trial_expires_at, None);
    }

    #[test]
    fn test_apply_clears_only_past_trial() {
        let now = Utc::now();
        let changes = SubscriptionChanges {
            clear_trial_expired_before: Some(now),
            ..Default::default()
        };

        let past = row(Some(now - Duration::days(1)));
        assert_eq!(changes.apply(&past, now).trial_expires_at, None);

        let future = now + Duration::days(1);
        assert_eq!(changes.apply(&row(Some(future)), now).trial_expires_at, Some(future));
    }

    #[test]
    fn test_apply_explicit_trial_wins() {
        let now = Utc::now();
        let changes = SubscriptionChanges {
            trial_expires_at: Some(None),
            ..Default::default()
        };
        assert_eq!(
            changes.apply(&row(Some(now + Duration::days(5))), now).trial_expires_at,
            None
        );
    }
}
