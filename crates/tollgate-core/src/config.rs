//! Engine configuration

use std::time::Duration;

use tollgate_types::Tier;

/// What a read does when the subscription/override store fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFaultPolicy {
    /// Surface `StoreUnavailable` to the caller
    #[default]
    Propagate,
    /// Answer with the empty grant (deny everything)
    FailClosed,
    /// Answer with the given tier's defaults
    FailOpen { tier: Tier },
}

impl std::str::FromStr for StoreFaultPolicy {
    type Err = String;

    /// Parses `propagate`, `fail_closed` or `fail_open:<tier>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "fail_closed" => Ok(Self::FailClosed),
            other => {
                let tier = other
                    .strip_prefix("fail_open:")
                    .ok_or_else(|| format!("invalid store fault policy: {s}"))?;
                let tier = tier.parse().map_err(|e| format!("{e}"))?;
                Ok(Self::FailOpen { tier })
            }
        }
    }
}

/// Entitlement engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lifetime of a cached permissions snapshot.
    /// Default: 300 seconds
    pub cache_ttl: Duration,

    /// Maximum number of tenants held by the in-process cache.
    /// Default: 10,000
    pub cache_capacity: u64,

    /// Read behavior on store faults.
    /// Default: propagate
    pub store_fault_policy: StoreFaultPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 10_000,
            store_fault_policy: StoreFaultPolicy::Propagate,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the store fault policy.
    #[must_use]
    pub fn with_store_fault_policy(mut self, policy: StoreFaultPolicy) -> Self {
        self.store_fault_policy = policy;
        self
    }
}
