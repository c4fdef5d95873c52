//! Tier catalog
//!
//! Static table of tier defaults. Tenants never change it; operators can load
//! a replacement from JSON at startup.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Feature, Limit, LimitValue, Tier};

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Tier has no definition in this catalog
    #[error("unknown tier: {0}")]
    UnknownTier(String),

    /// Catalog document could not be parsed
    #[error("invalid tier catalog: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Default grants and limits for one tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Feature defaults; a missing feature is not granted
    #[serde(default)]
    pub features: BTreeMap<Feature, bool>,
    /// Limit defaults; a missing limit is zero
    #[serde(default)]
    pub limits: BTreeMap<Limit, LimitValue>,
}

impl TierDefinition {
    /// Build a definition granting exactly `granted` with the given limits
    pub fn new(granted: &[Feature], limits: [(Limit, LimitValue); 4]) -> Self {
        Self {
            features: Feature::ALL
                .into_iter()
                .map(|feature| (feature, granted.contains(&feature)))
                .collect(),
            limits: limits.into_iter().collect(),
        }
    }

    pub fn grants(&self, feature: Feature) -> bool {
        self.features.get(&feature).copied().unwrap_or(false)
    }

    pub fn limit(&self, limit: Limit) -> LimitValue {
        self.limits
            .get(&limit)
            .copied()
            .unwrap_or(LimitValue::Limited(0))
    }
}

/// Lookup table from tier to its definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierCatalog {
    tiers: HashMap<Tier, TierDefinition>,
}

impl TierCatalog {
    /// Catalog with an explicit set of definitions
    pub fn new(tiers: HashMap<Tier, TierDefinition>) -> Self {
        Self { tiers }
    }

    /// Built-in tier table
    pub fn standard() -> Self {
        use Feature::*;
        use Limit::*;
        use LimitValue::{Limited, Unlimited};

        let tiers = HashMap::from([
            (
                Tier::Demo,
                TierDefinition::new(
                    &[],
                    [
                        (MaxDevices, Limited(1)),
                        (MaxUsers, Limited(2)),
                        (MaxOrdersPerMonth, Limited(100)),
                        (MaxTerminals, Limited(1)),
                    ],
                ),
            ),
            (
                Tier::Core,
                TierDefinition::new(
                    &[LoyaltyPrograms],
                    [
                        (MaxDevices, Limited(3)),
                        (MaxUsers, Limited(10)),
                        (MaxOrdersPerMonth, Limited(5_000)),
                        (MaxTerminals, Limited(2)),
                    ],
                ),
            ),
            (
                Tier::Pro,
                TierDefinition::new(
                    &[
                        Payroll,
                        AdvancedReporting,
                        MultiLocation,
                        LoyaltyPrograms,
                        RecipeManagement,
                        AccountingIntegration,
                    ],
                    [
                        (MaxDevices, Limited(10)),
                        (MaxUsers, Limited(50)),
                        (MaxOrdersPerMonth, Limited(50_000)),
                        (MaxTerminals, Limited(10)),
                    ],
                ),
            ),
            (
                Tier::Enterprise,
                TierDefinition::new(
                    &Feature::ALL,
                    [
                        (MaxDevices, Unlimited),
                        (MaxUsers, Unlimited),
                        (MaxOrdersPerMonth, Unlimited),
                        (MaxTerminals, Unlimited),
                    ],
                ),
            ),
        ]);

        Self { tiers }
    }

    /// Parse a catalog from its JSON form
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a tier definition
    pub fn get(&self, tier: Tier) -> Result<&TierDefinition, CatalogError> {
        self.tiers
            .get(&tier)
            .ok_or_else(|| CatalogError::UnknownTier(tier.to_string()))
    }

    /// Whether the catalog defines `tier`
    pub fn contains(&self, tier: Tier) -> bool {
        self.tiers.contains_key(&tier)
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_every_tier() {
        let catalog = TierCatalog::standard();
        for tier in Tier::ALL {
            assert!(catalog.get(tier).is_ok(), "missing {tier}");
        }
    }

    #[test]
    fn test_core_does_not_grant_payroll() {
        let catalog = TierCatalog::standard();
        let core = catalog.get(Tier::Core).unwrap();
        assert!(!core.grants(Feature::Payroll));
        assert_eq!(core.limit(Limit::MaxDevices), LimitValue::Limited(3));
    }

    #[test]
    fn test_enterprise_is_unlimited() {
        let catalog = TierCatalog::standard();
        let enterprise = catalog.get(Tier::Enterprise).unwrap();
        for feature in Feature::ALL {
            assert!(enterprise.grants(feature));
        }
        for limit in Limit::ALL {
            assert!(enterprise.limit(limit).is_unlimited());
        }
    }

    #[test]
    fn test_catalog_from_json_defaults_missing_entries() {
        let catalog = TierCatalog::from_json(
            r#"{ "core": { "features": { "payroll": true }, "limits": { "max_devices": 4 } } }"#,
        )
        .unwrap();

        let core = catalog.get(Tier::Core).unwrap();
        assert!(core.grants(Feature::Payroll));
        assert!(!core.grants(Feature::ApiAccess));
        assert_eq!(core.limit(Limit::MaxDevices), LimitValue::Limited(4));
        assert_eq!(core.limit(Limit::MaxUsers), LimitValue::Limited(0));

        assert!(matches!(
            catalog.get(Tier::Pro),
            Err(CatalogError::UnknownTier(name)) if name == "pro"
        ));
    }

    #[test]
    fn test_catalog_rejects_unknown_feature_names() {
        let result = TierCatalog::from_json(r#"{ "core": { "features": { "teleport": true } } }"#);
        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }
}
