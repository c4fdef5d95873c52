//! Resolved grants and the permissions snapshot

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntitlementStatus, Feature, Limit, LimitValue, TierDefinition, Tier};

/// The resolved features and limits for one tenant at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveGrant {
    features: BTreeSet<Feature>,
    limits: BTreeMap<Limit, LimitValue>,
}

impl EffectiveGrant {
    /// No features, every limit zero
    pub fn empty() -> Self {
        Self {
            features: BTreeSet::new(),
            limits: Limit::ALL
                .into_iter()
                .map(|limit| (limit, LimitValue::Limited(0)))
                .collect(),
        }
    }

    /// Every feature, every limit unlimited
    pub fn unrestricted() -> Self {
        Self {
            features: Feature::ALL.into_iter().collect(),
            limits: Limit::ALL
                .into_iter()
                .map(|limit| (limit, LimitValue::Unlimited))
                .collect(),
        }
    }

    /// Start from a tier's defaults
    pub fn from_tier(definition: &TierDefinition) -> Self {
        Self {
            features: Feature::ALL
                .into_iter()
                .filter(|feature| definition.grants(*feature))
                .collect(),
            limits: Limit::ALL
                .into_iter()
                .map(|limit| (limit, definition.limit(limit)))
                .collect(),
        }
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        if enabled {
            self.features.insert(feature);
        } else {
            self.features.remove(&feature);
        }
    }

    pub fn set_limit(&mut self, limit: Limit, value: LimitValue) {
        self.limits.insert(limit, value);
    }

    pub fn grant_all_features(&mut self) {
        self.features.extend(Feature::ALL);
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn limit(&self, limit: Limit) -> LimitValue {
        self.limits
            .get(&limit)
            .copied()
            .unwrap_or(LimitValue::Limited(0))
    }

    /// Granted features in allow-list order
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn limits(&self) -> &BTreeMap<Limit, LimitValue> {
        &self.limits
    }
}

impl Default for EffectiveGrant {
    fn default() -> Self {
        Self::empty()
    }
}

/// Snapshot returned by `GetPermissions` and stored in the cache.
///
/// The first five fields are the cache wire format and must keep their
/// names. `limits` was added later; entries written without it are still
/// readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Granted feature names
    pub granted_features: Vec<Feature>,
    /// Subscription tier, `null` when there is none or it is unknown
    pub tier: Option<Tier>,
    /// Subscription status, `none` without a subscription
    pub status: EntitlementStatus,
    /// Demo trial end
    pub demo_expires_at: Option<DateTime<Utc>>,
    /// Resolved `max_devices`, `-1` when unlimited
    pub device_limit: LimitValue,
    /// Every resolved limit
    #[serde(default)]
    pub limits: BTreeMap<Limit, LimitValue>,
}

impl Permissions {
    /// Assemble a snapshot from a grant and its subscription metadata
    pub fn new(
        grant: &EffectiveGrant,
        tier: Option<Tier>,
        status: EntitlementStatus,
        demo_expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            granted_features: grant.features().collect(),
            tier,
            status,
            demo_expires_at,
            device_limit: grant.limit(Limit::MaxDevices),
            limits: grant.limits().clone(),
        }
    }

    /// Snapshot for a tenant without any subscription
    pub fn none() -> Self {
        Self::new(&EffectiveGrant::empty(), None, EntitlementStatus::None, None)
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.granted_features.contains(&feature)
    }

    /// Resolved value of a limit, falling back to `device_limit` for
    /// snapshots written before `limits` existed
    pub fn limit(&self, limit: Limit) -> LimitValue {
        match self.limits.get(&limit) {
            Some(value) => *value,
            None if limit == Limit::MaxDevices => self.device_limit,
            None => LimitValue::Limited(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TierCatalog;

    #[test]
    fn test_empty_grant_has_zero_limits() {
        let grant = EffectiveGrant::empty();
        assert_eq!(grant.features().count(), 0);
        for limit in Limit::ALL {
            assert_eq!(grant.limit(limit), LimitValue::Limited(0));
        }
    }

    #[test]
    fn test_set_feature_toggles() {
        let mut grant = EffectiveGrant::empty();
        grant.set_feature(Feature::Payroll, true);
        assert!(grant.has_feature(Feature::Payroll));
        grant.set_feature(Feature::Payroll, false);
        assert!(!grant.has_feature(Feature::Payroll));
    }

    #[test]
    fn test_none_snapshot_wire_shape() {
        let json = serde_json::to_value(Permissions::none()).unwrap();
        assert_eq!(json["granted_features"], serde_json::json!([]));
        assert_eq!(json["tier"], serde_json::Value::Null);
        assert_eq!(json["status"], "none");
        assert_eq!(json["demo_expires_at"], serde_json::Value::Null);
        assert_eq!(json["device_limit"], 0);
    }

    #[test]
    fn test_snapshot_features_in_allow_list_order() {
        let catalog = TierCatalog::standard();
        let grant = EffectiveGrant::from_tier(catalog.get(Tier::Pro).unwrap());
        let snapshot = Permissions::new(&grant, Some(Tier::Pro), EntitlementStatus::Active, None);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tier"], "pro");
        assert_eq!(json["device_limit"], 10);
        assert_eq!(json["granted_features"][0], "payroll");
    }

    #[test]
    fn test_snapshot_without_limits_key_still_decodes() {
        let json = r#"{
            "granted_features": ["loyalty_programs"],
            "tier": "core",
            "status": "active",
            "demo_expires_at": null,
            "device_limit": 3
        }"#;
        let snapshot: Permissions = serde_json::from_str(json).unwrap();

        assert!(snapshot.has_feature(Feature::LoyaltyPrograms));
        assert_eq!(snapshot.limit(Limit::MaxDevices), LimitValue::Limited(3));
        assert_eq!(snapshot.limit(Limit::MaxUsers), LimitValue::Limited(0));
    }
}
