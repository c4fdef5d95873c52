//! Cached entitlement reads
//!
//! Answers feature checks and permission snapshots from the cache when it
//! can, from the resolver when it must. Cache faults degrade to a direct
//! resolution and are never returned; store faults follow the configured
//! [`StoreFaultPolicy`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tollgate_db::{OverrideRepository, SubscriptionRepository};
use tollgate_types::{Feature, Limit, LimitValue, Permissions, TenantId};
use tracing::instrument;

use crate::cache::{cache_key, CacheError, GrantCache};
use crate::metrics::{self, CacheOp, ReadTimer};
use crate::resolver::{GrantSource, Resolution, Resolver};
use crate::{EngineConfig, EngineError, StoreFaultPolicy};

/// Outcome of a cache lookup
enum Lookup {
    Hit(Permissions),
    Miss,
    /// No usable backend; skip the write-back for this call
    Unavailable,
}

/// Entitlement read service
pub struct EntitlementService<S: SubscriptionRepository, O: OverrideRepository> {
    resolver: Resolver<S, O>,
    cache: Option<Arc<dyn GrantCache>>,
    config: EngineConfig,
}

impl<S: SubscriptionRepository, O: OverrideRepository> Clone for EntitlementService<S, O> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: SubscriptionRepository, O: OverrideRepository> std::fmt::Debug
    for EntitlementService<S, O>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementService")
            .field("cache_enabled", &self.cache.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl<S: SubscriptionRepository, O: OverrideRepository> EntitlementService<S, O> {
    /// Create a service. Without a cache every read resolves from the store.
    pub fn new(
        resolver: Resolver<S, O>,
        cache: Option<Arc<dyn GrantCache>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver,
            cache,
            config,
        }
    }

    pub fn resolver(&self) -> &Resolver<S, O> {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `feature_name` is granted. Names outside the allow-list are
    /// never granted.
    #[instrument(skip(self), level = "debug")]
    pub async fn check_feature(
        &self,
        tenant_id: &TenantId,
        feature_name: &str,
        privileged: bool,
    ) -> Result<bool, EngineError> {
        let Ok(feature) = feature_name.parse::<Feature>() else {
            tracing::debug!(%tenant_id, feature_name, "Unknown feature name, denying");
            return Ok(false);
        };

        let timer = ReadTimer::start("check_feature");
        let result = self.permissions(tenant_id, privileged).await;
        timer.finish();

        Ok(result?.has_feature(feature))
    }

    /// Permissions snapshot for a non-privileged caller
    pub async fn get_permissions(&self, tenant_id: &TenantId) -> Result<Permissions, EngineError> {
        self.get_permissions_as(tenant_id, false).await
    }

    /// Permissions snapshot
    #[instrument(skip(self), level = "debug")]
    pub async fn get_permissions_as(
        &self,
        tenant_id: &TenantId,
        privileged: bool,
    ) -> Result<Permissions, EngineError> {
        let timer = ReadTimer::start("get_permissions");
        let result = self.permissions(tenant_id, privileged).await;
        timer.finish();
        result
    }

    /// Resolved value of one limit, under the same precedence as features
    #[instrument(skip(self), level = "debug")]
    pub async fn effective_limit(
        &self,
        tenant_id: &TenantId,
        limit: Limit,
        privileged: bool,
    ) -> Result<LimitValue, EngineError> {
        let timer = ReadTimer::start("effective_limit");
        let result = self.permissions(tenant_id, privileged).await;
        timer.finish();

        Ok(result?.limit(limit))
    }

    /// Drop a tenant's cached snapshot. Failures are logged, never returned.
    pub async fn invalidate_cache(&self, tenant_id: &TenantId) {
        if let Err(err) = self.try_invalidate(tenant_id).await {
            tracing::warn!(%tenant_id, error = %err, "Cache invalidation failed, entry expires with its TTL");
        }
    }

    /// Drop a tenant's cached snapshot, reporting backend failures
    pub async fn try_invalidate(&self, tenant_id: &TenantId) -> Result<(), CacheError> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };

        cache.invalidate(&cache_key(tenant_id)).await.inspect_err(|_| {
            metrics::record_cache_error(CacheOp::Invalidate);
        })
    }

    async fn permissions(
        &self,
        tenant_id: &TenantId,
        privileged: bool,
    ) -> Result<Permissions, EngineError> {
        if privileged {
            metrics::record_resolution(GrantSource::Privileged);
            return Ok(Resolution::privileged().permissions());
        }

        let key = cache_key(tenant_id);
        let write_back = match self.lookup(&key).await {
            Lookup::Hit(permissions) => return Ok(permissions),
            Lookup::Miss => true,
            Lookup::Unavailable => false,
        };

        let resolution = self.resolve_or_degrade(tenant_id).await?;
        metrics::record_resolution(resolution.source);
        let permissions = resolution.permissions();

        if write_back {
            if let Some(ttl) = resolution.cache_ttl(self.config.cache_ttl, Utc::now()) {
                self.store(&key, &permissions, ttl).await;
            }
        }

        Ok(permissions)
    }

    async fn lookup(&self, key: &str) -> Lookup {
        let Some(cache) = &self.cache else {
            return Lookup::Unavailable;
        };

        match cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Permissions>(&raw) {
                Ok(permissions) => {
                    tracing::trace!(key, "permissions cache hit");
                    metrics::record_cache_hit("permissions");
                    Lookup::Hit(permissions)
                }
                Err(err) => {
                    // Overwritten by the fresh snapshot below
                    let err = CacheError::from(err);
                    tracing::warn!(key, error = %err, "Discarding undecodable cache entry");
                    metrics::record_cache_error(CacheOp::Decode);
                    Lookup::Miss
                }
            },
            Ok(None) => {
                metrics::record_cache_miss("permissions");
                Lookup::Miss
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache unavailable, resolving directly");
                metrics::record_cache_error(CacheOp::Get);
                Lookup::Unavailable
            }
        }
    }

    async fn store(&self, key: &str, permissions: &Permissions, ttl: Duration) {
        let Some(cache) = &self.cache else {
            return;
        };

        let raw = match serde_json::to_string(permissions) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(key, error = %err, "Failed to encode permissions snapshot");
                return;
            }
        };

        if let Err(err) = cache.put(key, raw, ttl).await {
            tracing::warn!(key, error = %err, "Failed to cache permissions snapshot");
            metrics::record_cache_error(CacheOp::Put);
        }
    }

    async fn resolve_or_degrade(&self, tenant_id: &TenantId) -> Result<Resolution, EngineError> {
        let err = match self.resolver.resolve(tenant_id, false).await {
            Err(err @ EngineError::StoreUnavailable(_)) => err,
            other => return other,
        };

        match self.config.store_fault_policy {
            StoreFaultPolicy::Propagate => {
                metrics::record_store_fault("propagate");
                Err(err)
            }
            StoreFaultPolicy::FailClosed => {
                tracing::warn!(%tenant_id, error = %err, "Store unavailable, failing closed");
                metrics::record_store_fault("fail_closed");
                Ok(Resolution::fail_closed())
            }
            StoreFaultPolicy::FailOpen { tier } => {
                tracing::warn!(%tenant_id, %tier, error = %err, "Store unavailable, failing open");
                metrics::record_store_fault("fail_open");
                Ok(Resolution::fail_open(tier, self.resolver.catalog()))
            }
        }
    }
}
