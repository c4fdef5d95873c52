//! Entitlement names and values
//!
//! Features are boolean grants, limits are numeric caps. Both allow-lists are
//! closed: anything not listed here is rejected at the boundary.

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Boolean product features that can be granted to a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Staff payroll
    Payroll,
    /// AI assistant
    AiAssistant,
    /// Public API access
    ApiAccess,
    /// Advanced reporting and exports
    AdvancedReporting,
    /// More than one business location
    MultiLocation,
    /// Customer loyalty programs
    LoyaltyPrograms,
    /// Recipe and ingredient management
    RecipeManagement,
    /// Third-party accounting sync
    AccountingIntegration,
}

impl Feature {
    /// Every known feature, in wire order
    pub const ALL: [Feature; 8] = [
        Self::Payroll,
        Self::AiAssistant,
        Self::ApiAccess,
        Self::AdvancedReporting,
        Self::MultiLocation,
        Self::LoyaltyPrograms,
        Self::RecipeManagement,
        Self::AccountingIntegration,
    ];

    /// Get the feature name string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payroll => "payroll",
            Self::AiAssistant => "ai_assistant",
            Self::ApiAccess => "api_access",
            Self::AdvancedReporting => "advanced_reporting",
            Self::MultiLocation => "multi_location",
            Self::LoyaltyPrograms => "loyalty_programs",
            Self::RecipeManagement => "recipe_management",
            Self::AccountingIntegration => "accounting_integration",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Feature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| ParseError::UnknownName(s.to_string()))
    }
}

/// Numeric resource limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// Registered devices
    MaxDevices,
    /// Staff user accounts
    MaxUsers,
    /// Orders per calendar month
    MaxOrdersPerMonth,
    /// Payment terminals
    MaxTerminals,
}

impl Limit {
    /// Every known limit, in wire order
    pub const ALL: [Limit; 4] = [
        Self::MaxDevices,
        Self::MaxUsers,
        Self::MaxOrdersPerMonth,
        Self::MaxTerminals,
    ];

    /// Get the limit name string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MaxDevices => "max_devices",
            Self::MaxUsers => "max_users",
            Self::MaxOrdersPerMonth => "max_orders_per_month",
            Self::MaxTerminals => "max_terminals",
        }
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Limit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|limit| limit.as_str() == s)
            .ok_or_else(|| ParseError::UnknownName(s.to_string()))
    }
}

/// Any name an override may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntitlementName {
    Feature(Feature),
    Limit(Limit),
}

impl EntitlementName {
    /// Get the name string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feature(feature) => feature.as_str(),
            Self::Limit(limit) => limit.as_str(),
        }
    }

    /// Parse a value for this name.
    ///
    /// Features take `true`/`false`; limits take a non-negative integer or
    /// `unlimited`.
    pub fn parse_value(&self, raw: &str) -> Result<OverrideValue, ParseError> {
        let invalid = || ParseError::InvalidValue {
            name: self.as_str().to_string(),
            value: raw.to_string(),
        };

        match self {
            Self::Feature(_) => match raw.trim().to_lowercase().as_str() {
                "true" => Ok(OverrideValue::Bool(true)),
                "false" => Ok(OverrideValue::Bool(false)),
                _ => Err(invalid()),
            },
            Self::Limit(_) => raw
                .parse::<LimitValue>()
                .map(OverrideValue::Limit)
                .map_err(|_| invalid()),
        }
    }
}

impl std::fmt::Display for EntitlementName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntitlementName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(feature) = s.parse::<Feature>() {
            return Ok(Self::Feature(feature));
        }
        if let Ok(limit) = s.parse::<Limit>() {
            return Ok(Self::Limit(limit));
        }
        Err(ParseError::UnknownName(s.to_string()))
    }
}

/// A resolved limit.
///
/// Serialized as an integer; `-1` means unlimited. Other negatives are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LimitValue {
    Limited(u64),
    Unlimited,
}

impl LimitValue {
    /// Sentinel used on the wire for [`LimitValue::Unlimited`]
    pub const UNLIMITED_SENTINEL: i64 = -1;

    /// Whether `count` is still below this limit
    pub fn allows(&self, count: u64) -> bool {
        match self {
            Self::Limited(max) => count < *max,
            Self::Unlimited => true,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl TryFrom<i64> for LimitValue {
    type Error = ParseError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            Self::UNLIMITED_SENTINEL => Ok(Self::Unlimited),
            _ => u64::try_from(raw)
                .map(Self::Limited)
                .map_err(|_| ParseError::InvalidValue {
                    name: "limit".to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

impl From<LimitValue> for i64 {
    fn from(value: LimitValue) -> Self {
        match value {
            LimitValue::Limited(max) => i64::try_from(max).unwrap_or(i64::MAX),
            LimitValue::Unlimited => LimitValue::UNLIMITED_SENTINEL,
        }
    }
}

impl std::fmt::Display for LimitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limited(max) => write!(f, "{max}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl std::str::FromStr for LimitValue {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::Unlimited);
        }
        trimmed.parse::<u64>().map(Self::Limited)
    }
}

/// Typed override value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideValue {
    Bool(bool),
    Limit(LimitValue),
}

impl OverrideValue {
    /// Text form persisted in the override store
    pub fn to_stored(&self) -> String {
        match self {
            Self::Bool(enabled) => enabled.to_string(),
            Self::Limit(limit) => limit.to_string(),
        }
    }
}
