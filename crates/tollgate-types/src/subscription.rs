//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParseError, TenantId, Tier};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// In good standing
    Active,
    /// Temporarily switched off by an operator
    Suspended,
    /// Cancelled by the tenant or an operator
    Cancelled,
    /// Lapsed
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] =
        [Self::Active, Self::Suspended, Self::Cancelled, Self::Expired];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}

/// Status reported alongside a resolved grant.
///
/// Same as [`SubscriptionStatus`] plus `none` for tenants without a
/// subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    Active,
    Suspended,
    Cancelled,
    Expired,
    None,
}

impl From<SubscriptionStatus> for EntitlementStatus {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Active => Self::Active,
            SubscriptionStatus::Suspended => Self::Suspended,
            SubscriptionStatus::Cancelled => Self::Cancelled,
            SubscriptionStatus::Expired => Self::Expired,
        }
    }
}

impl std::fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Suspended => f.write_str("suspended"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Expired => f.write_str("expired"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Tenant subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// Owning tenant, at most one subscription each
    pub tenant_id: TenantId,
    /// Current tier
    pub tier: Tier,
    /// Lifecycle status
    pub status: SubscriptionStatus,
    /// End of the demo trial, if one was granted
    pub trial_expires_at: Option<DateTime<Utc>>,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription is in an unexpired demo trial at `now`
    pub fn in_trial(&self, now: DateTime<Utc>) -> bool {
        self.tier.supports_trial() && self.trial_expires_at.is_some_and(|expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(tier: Tier, trial: Option<DateTime<Utc>>) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: SubscriptionId(Uuid::new_v4()),
            tenant_id: TenantId::new(),
            tier,
            status: SubscriptionStatus::Active,
            trial_expires_at: trial,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("active".parse::<SubscriptionStatus>().unwrap(), SubscriptionStatus::Active);
        assert_eq!(
            "cancelled".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert!("Active".parse::<SubscriptionStatus>().is_err());
        assert!("canceled".parse::<SubscriptionStatus>().is_err());
        assert_eq!(
            "paused".parse::<SubscriptionStatus>(),
            Err(ParseError::InvalidStatus("paused".to_string()))
        );
    }

    #[test]
    fn test_in_trial_requires_demo_and_future_expiry() {
        let now = Utc::now();
        assert!(subscription(Tier::Demo, Some(now + Duration::days(3))).in_trial(now));
        assert!(!subscription(Tier::Demo, Some(now - Duration::seconds(1))).in_trial(now));
        assert!(!subscription(Tier::Demo, Some(now)).in_trial(now));
        assert!(!subscription(Tier::Demo, None).in_trial(now));
        assert!(!subscription(Tier::Pro, Some(now + Duration::days(3))).in_trial(now));
    }

    #[test]
    fn test_entitlement_status_serializes_none() {
        assert_eq!(serde_json::to_string(&EntitlementStatus::None).unwrap(), "\"none\"");
        assert_eq!(
            EntitlementStatus::from(SubscriptionStatus::Suspended),
            EntitlementStatus::Suspended
        );
    }
}
