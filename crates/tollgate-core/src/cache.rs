//! Permissions cache
//!
//! Snapshots are stored as serialized JSON under `entitlements:<tenant_id>`
//! so a shared key-value backend can sit behind the same trait. The
//! in-process implementation uses moka.
//!
//! A cache failure is never fatal to a read: the service falls back to
//! direct resolution.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use thiserror::Error;
use tollgate_types::TenantId;

use crate::EngineConfig;

/// Key prefix for cached permissions snapshots
pub const CACHE_KEY_PREFIX: &str = "entitlements:";

/// Cache key for a tenant's snapshot
pub fn cache_key(tenant_id: &TenantId) -> String {
    format!("{CACHE_KEY_PREFIX}{tenant_id}")
}

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable or refused the operation
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// Stored entry could not be decoded
    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key-value store for serialized permissions snapshots
#[async_trait]
pub trait GrantCache: Send + Sync {
    /// Fetch an entry, `None` on miss or expiry
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store an entry that expires after `ttl`
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry; removing a missing key succeeds
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// Entry with its own lifetime
#[derive(Clone)]
struct Snapshot {
    raw: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with
struct SnapshotExpiry;

impl Expiry<String, Snapshot> for SnapshotExpiry {
    fn expire_after_create(&self, _key: &String, value: &Snapshot, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Snapshot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache with a TTL ceiling and bounded capacity
#[derive(Clone)]
pub struct MokaGrantCache {
    entries: Cache<String, Snapshot>,
    ttl: Duration,
}

impl MokaGrantCache {
    /// Create a cache with the given TTL ceiling and capacity
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .expire_after(SnapshotExpiry)
                .max_capacity(max_capacity)
                .build(),
            ttl,
        }
    }

    /// Create a cache sized from engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_ttl, config.cache_capacity)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for MokaGrantCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaGrantCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl GrantCache for MokaGrantCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|snapshot| snapshot.raw))
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let snapshot = Snapshot {
            raw: value,
            ttl: ttl.min(self.ttl),
        };
        self.entries.insert(key.to_string(), snapshot).await;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
