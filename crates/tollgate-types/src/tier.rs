//! Subscription tier types

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Subscription tier levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Demo tier - single device, eligible for a time-bounded trial
    Demo,
    /// Core tier - single location point of sale
    Core,
    /// Pro tier - multi-location, payroll and reporting
    Pro,
    /// Enterprise tier - everything, no limits
    Enterprise,
}

impl Tier {
    /// All tiers, lowest first
    pub const ALL: [Tier; 4] = [Self::Demo, Self::Core, Self::Pro, Self::Enterprise];

    /// Get the tier name as stored and sent over the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Core => "core",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Whether this tier can carry a trial expiry
    pub const fn supports_trial(&self) -> bool {
        matches!(self, Self::Demo)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "core" => Ok(Self::Core),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ParseError::InvalidTier(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse_is_case_insensitive() {
        assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
        assert_eq!(" demo ".parse::<Tier>().unwrap(), Tier::Demo);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_display_round_trips() {
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_only_demo_supports_trial() {
        assert!(Tier::Demo.supports_trial());
        assert!(!Tier::Core.supports_trial());
        assert!(!Tier::Enterprise.supports_trial());
    }
}
