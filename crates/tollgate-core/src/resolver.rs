//! Entitlement resolution
//!
//! Precedence, highest first: privileged bypass, missing subscription,
//! status gate, demo trial, tier defaults with overrides applied.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tollgate_db::{OverrideRepository, SubscriptionRepository};
use tollgate_types::{
    EffectiveGrant, EntitlementName, EntitlementStatus, Override, OverrideValue, ParseError,
    Permissions, Subscription, SubscriptionStatus, TenantId, Tier, TierCatalog,
};
use tracing::instrument;

use crate::EngineError;

/// Which precedence layer produced a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSource {
    /// Privileged caller, nothing loaded
    Privileged,
    /// Tenant has no subscription
    NoSubscription,
    /// Subscription exists but is not active
    Inactive,
    /// Unexpired demo trial
    Trial,
    /// Tier defaults plus overrides
    Tier,
    /// Subscription tier missing from the catalog
    UnknownTier,
    /// Store fault answered with the empty grant
    FailClosed,
    /// Store fault answered with a fallback tier's defaults
    FailOpen,
}

impl GrantSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Privileged => "privileged",
            Self::NoSubscription => "no_subscription",
            Self::Inactive => "inactive",
            Self::Trial => "trial",
            Self::Tier => "tier",
            Self::UnknownTier => "unknown_tier",
            Self::FailClosed => "fail_closed",
            Self::FailOpen => "fail_open",
        }
    }
}

/// A resolved grant with the subscription metadata it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub grant: EffectiveGrant,
    pub tier: Option<Tier>,
    pub status: EntitlementStatus,
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub source: GrantSource,
}

impl Resolution {
    /// Every feature, every limit unlimited
    pub fn privileged() -> Self {
        Self {
            grant: EffectiveGrant::unrestricted(),
            tier: None,
            status: EntitlementStatus::Active,
            trial_expires_at: None,
            source: GrantSource::Privileged,
        }
    }

    /// No subscription, no entitlement
    pub fn none() -> Self {
        Self {
            grant: EffectiveGrant::empty(),
            tier: None,
            status: EntitlementStatus::None,
            trial_expires_at: None,
            source: GrantSource::NoSubscription,
        }
    }

    /// Store fault answered by denying everything
    pub fn fail_closed() -> Self {
        Self {
            source: GrantSource::FailClosed,
            ..Self::none()
        }
    }

    /// Store fault answered with `tier`'s defaults as an active subscription.
    ///
    /// Falls back to the empty grant if the catalog lacks `tier`.
    pub fn fail_open(tier: Tier, catalog: &TierCatalog) -> Self {
        let grant = catalog
            .get(tier)
            .map(EffectiveGrant::from_tier)
            .unwrap_or_else(|_| EffectiveGrant::empty());

        Self {
            grant,
            tier: Some(tier),
            status: EntitlementStatus::Active,
            trial_expires_at: None,
            source: GrantSource::FailOpen,
        }
    }

    /// Whether this resolution may be written to the cache
    pub fn is_cacheable(&self) -> bool {
        !matches!(
            self.source,
            GrantSource::Privileged | GrantSource::FailClosed | GrantSource::FailOpen
        )
    }

    /// How long this resolution may stay cached, at most `ttl`.
    ///
    /// A trial grant never outlives the trial; `None` once it has lapsed.
    pub fn cache_ttl(&self, ttl: Duration, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_cacheable() {
            return None;
        }
        match (self.source, self.trial_expires_at) {
            (GrantSource::Trial, Some(expires)) => (expires - now)
                .to_std()
                .ok()
                .filter(|left| !left.is_zero())
                .map(|left| left.min(ttl)),
            _ => Some(ttl),
        }
    }

    /// Snapshot in the `GetPermissions` shape
    pub fn permissions(&self) -> Permissions {
        Permissions::new(&self.grant, self.tier, self.status, self.trial_expires_at)
    }
}

/// Compute the grant for a loaded subscription.
///
/// Pure: no I/O, `now` supplied by the caller. Overrides must belong to the
/// subscription's tenant.
pub fn resolve_grant(
    subscription: Option<&Subscription>,
    overrides: &[Override],
    catalog: &TierCatalog,
    now: DateTime<Utc>,
) -> Resolution {
    let Some(sub) = subscription else {
        return Resolution::none();
    };

    let mut resolution = Resolution {
        grant: EffectiveGrant::empty(),
        tier: Some(sub.tier),
        status: sub.status.into(),
        trial_expires_at: sub.trial_expires_at,
        source: GrantSource::Inactive,
    };

    // Status gates before the trial: a cancelled or suspended demo gets nothing.
    if sub.status != SubscriptionStatus::Active {
        return resolution;
    }

    let definition = match catalog.get(sub.tier) {
        Ok(definition) => definition,
        Err(err) => {
            tracing::warn!(tenant_id = %sub.tenant_id, error = %err, "Subscription tier missing from catalog");
            resolution.source = GrantSource::UnknownTier;
            return resolution;
        }
    };

    let mut grant = EffectiveGrant::from_tier(definition);
    apply_overrides(&mut grant, overrides);

    resolution.source = if sub.in_trial(now) {
        grant.grant_all_features();
        GrantSource::Trial
    } else {
        GrantSource::Tier
    };
    resolution.grant = grant;
    resolution
}

/// Layer overrides over a grant. Each override fully replaces the value for
/// its own name.
pub fn apply_overrides(grant: &mut EffectiveGrant, overrides: &[Override]) {
    for o in overrides {
        match (o.name, o.value) {
            (EntitlementName::Feature(feature), OverrideValue::Bool(enabled)) => {
                grant.set_feature(feature, enabled);
            }
            (EntitlementName::Limit(limit), OverrideValue::Limit(value)) => {
                grant.set_limit(limit, value);
            }
            (name, value) => {
                tracing::warn!(tenant_id = %o.tenant_id, %name, ?value, "Override value does not match its name, ignoring");
            }
        }
    }
}

/// Resolves effective grants from the subscription and override stores
pub struct Resolver<S: SubscriptionRepository, O: OverrideRepository> {
    subscriptions: Arc<S>,
    overrides: Arc<O>,
    catalog: Arc<TierCatalog>,
}

impl<S: SubscriptionRepository, O: OverrideRepository> Clone for Resolver<S, O> {
    fn clone(&self) -> Self {
        Self {
            subscriptions: Arc::clone(&self.subscriptions),
            overrides: Arc::clone(&self.overrides),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S: SubscriptionRepository, O: OverrideRepository> Resolver<S, O> {
    /// Create a new resolver
    pub fn new(subscriptions: Arc<S>, overrides: Arc<O>, catalog: Arc<TierCatalog>) -> Self {
        Self {
            subscriptions,
            overrides,
            catalog,
        }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// Resolve a tenant's grant as of now
    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
        privileged: bool,
    ) -> Result<Resolution, EngineError> {
        self.resolve_at(tenant_id, privileged, Utc::now()).await
    }

    /// Resolve a tenant's grant as of `now`.
    ///
    /// A missing subscription is a valid empty result; a store failure is an
    /// error.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve_at(
        &self,
        tenant_id: &TenantId,
        privileged: bool,
        now: DateTime<Utc>,
    ) -> Result<Resolution, EngineError> {
        if privileged {
            return Ok(Resolution::privileged());
        }

        let Some(row) = self.subscriptions.find_by_tenant_id(tenant_id.0).await? else {
            return Ok(Resolution::none());
        };

        let subscription = match row.to_subscription() {
            Ok(subscription) => subscription,
            Err(err) => return Ok(malformed_subscription(tenant_id, &row.status, &err)),
        };

        // Overrides only matter for active subscriptions; skip the round-trip otherwise.
        let overrides = if subscription.status == SubscriptionStatus::Active {
            self.load_overrides(tenant_id).await?
        } else {
            Vec::new()
        };

        Ok(resolve_grant(Some(&subscription), &overrides, &self.catalog, now))
    }

    /// Load a tenant's overrides, skipping rows that do not parse
    async fn load_overrides(&self, tenant_id: &TenantId) -> Result<Vec<Override>, EngineError> {
        let rows = self.overrides.find_by_tenant_id(tenant_id.0).await?;

        Ok(rows
            .iter()
            .filter_map(|row| match row.to_override() {
                Ok(o) => Some(o),
                Err(err) => {
                    tracing::warn!(%tenant_id, name = %row.name, error = %err, "Ignoring unusable override");
                    None
                }
            })
            .collect())
    }
}

/// Resolution for a stored subscription whose tier or status does not parse
fn malformed_subscription(tenant_id: &TenantId, raw_status: &str, err: &ParseError) -> Resolution {
    tracing::warn!(%tenant_id, error = %err, "Stored subscription does not parse, granting nothing");

    let status = raw_status
        .parse::<SubscriptionStatus>()
        .map_or(EntitlementStatus::None, EntitlementStatus::from);

    Resolution {
        grant: EffectiveGrant::empty(),
        tier: None,
        status,
        trial_expires_at: None,
        source: if matches!(err, ParseError::InvalidTier(_)) {
            GrantSource::UnknownTier
        } else {
            GrantSource::Inactive
        },
    }
}

impl<S: SubscriptionRepository, O: OverrideRepository> std::fmt::Debug for Resolver<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
