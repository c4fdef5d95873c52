//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Enumerations are stored as text and converted to typed values here.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tollgate_types::{
    ActorId, AuditDiff, AuditEntry, EntitlementName, Override, ParseError, Subscription,
    SubscriptionId, TenantId,
};

/// Subscription row from the database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tier: String,
    pub status: String,
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Override row from the database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OverrideRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub value: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit log row from the database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub action: String,
    pub diff: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the typed domain subscription
    pub fn to_subscription(&self) -> Result<Subscription, ParseError> {
        Ok(Subscription {
            id: SubscriptionId(self.id),
            tenant_id: TenantId(self.tenant_id),
            tier: self.tier.parse()?,
            status: self.status.parse()?,
            trial_expires_at: self.trial_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// JSON form used in audit diffs
    pub fn audit_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "tenant_id": self.tenant_id,
            "tier": self.tier,
            "status": self.status,
            "trial_expires_at": self.trial_expires_at,
        })
    }
}

impl OverrideRow {
    /// Convert to the typed domain override.
    ///
    /// Fails for names outside the allow-list and values that do not parse
    /// for the name's kind.
    pub fn to_override(&self) -> Result<Override, ParseError> {
        let name: EntitlementName = self.name.parse()?;
        let value = name.parse_value(&self.value)?;

        Ok(Override {
            id: self.id,
            tenant_id: TenantId(self.tenant_id),
            name,
            value,
            created_by: ActorId(self.created_by),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// JSON form used in audit diffs
    pub fn audit_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "value": self.value,
            "created_by": self.created_by,
        })
    }
}

impl AuditRow {
    /// Convert to the domain audit entry
    pub fn to_entry(&self) -> AuditEntry {
        let diff = serde_json::from_value(self.diff.clone()).unwrap_or_else(|_| {
            AuditDiff::new(serde_json::Value::Null, self.diff.clone())
        });

        AuditEntry {
            id: self.id,
            actor_id: ActorId(self.actor_id),
            tenant_id: self.tenant_id.map(TenantId),
            action: self.action.clone(),
            diff,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_types::{Feature, Limit, LimitValue, OverrideValue, SubscriptionStatus, Tier};

    fn override_row(name: &str, value: &str) -> OverrideRow {
        let now = Utc::now();
        OverrideRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            value: value.to_string(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_subscription_row_conversion() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tier: "core".to_string(),
            status: "suspended".to_string(),
            trial_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        let sub = row.to_subscription().unwrap();
        assert_eq!(sub.tier, Tier::Core);
        assert_eq!(sub.status, SubscriptionStatus::Suspended);
        assert_eq!(sub.tenant_id.0, row.tenant_id);
    }

    #[test]
    fn test_subscription_row_with_unknown_tier() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tier: "legacy_gold".to_string(),
            status: "active".to_string(),
            trial_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(
            row.to_subscription(),
            Err(ParseError::InvalidTier("legacy_gold".to_string()))
        );
    }

    #[test]
    fn test_override_row_conversion() {
        let o = override_row("payroll", "true").to_override().unwrap();
        assert_eq!(o.name, EntitlementName::Feature(Feature::Payroll));
        assert_eq!(o.value, OverrideValue::Bool(true));

        let o = override_row("max_terminals", "6").to_override().unwrap();
        assert_eq!(o.name, EntitlementName::Limit(Limit::MaxTerminals));
        assert_eq!(o.value, OverrideValue::Limit(LimitValue::Limited(6)));
    }

    #[test]
    fn test_override_row_rejects_garbage() {
        assert!(override_row("max_devices", "many").to_override().is_err());
        assert!(override_row("teleport", "true").to_override().is_err());
    }

    #[test]
    fn test_audit_row_diff_round_trip() {
        let row = AuditRow {
            id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            tenant_id: None,
            action: "override.set".to_string(),
            diff: serde_json::json!({ "before": null, "after": { "value": "true" } }),
            created_at: Utc::now(),
        };

        let entry = row.to_entry();
        assert_eq!(entry.tenant_id, None);
        assert_eq!(entry.diff.after["value"], "true");
        assert!(entry.diff.before.is_null());
    }
}
