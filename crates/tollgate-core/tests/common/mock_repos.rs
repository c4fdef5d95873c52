//! Mock repositories and cache for testing

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tollgate_core::{CacheError, GrantCache};
use tollgate_db::{
    AuditRepository, AuditRow, Change, CreateAuditEntry, CreateSubscription, DbError, DbResult,
    OverrideRepository, OverrideRow, SubscriptionChanges, SubscriptionRepository,
    SubscriptionRow, UpsertOverride, Upserted,
};
use uuid::Uuid;

fn store_down() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolClosed)
}

/// Shared switch that makes a mock fail every call
#[derive(Default, Clone)]
pub struct FaultSwitch(Arc<AtomicBool>);

impl FaultSwitch {
    pub fn fail(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> DbResult<()> {
        if self.0.load(Ordering::SeqCst) {
            Err(store_down())
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
    by_tenant: Arc<DashMap<Uuid, Uuid>>,
    reads: Arc<AtomicUsize>,
    pub faults: FaultSwitch,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test subscription directly
    pub fn insert(&self, row: SubscriptionRow) {
        self.by_tenant.insert(row.tenant_id, row.id);
        self.subscriptions.insert(row.id, row);
    }

    /// Build an active subscription row
    #[allow(dead_code)]
    pub fn row(tenant_id: Uuid, tier: &str, status: &str) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id,
            tier: tier.to_string(),
            status: status.to_string(),
            trial_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite fields in place, bypassing the admin path
    #[allow(dead_code)]
    pub fn set_tier(&self, tenant_id: Uuid, tier: &str) {
        if let Some(id) = self.by_tenant.get(&tenant_id) {
            if let Some(mut row) = self.subscriptions.get_mut(id.value()) {
                row.tier = tier.to_string();
            }
        }
    }

    #[allow(dead_code)]
    pub fn set_trial(&self, tenant_id: Uuid, trial_expires_at: Option<DateTime<Utc>>) {
        if let Some(id) = self.by_tenant.get(&tenant_id) {
            if let Some(mut row) = self.subscriptions.get_mut(id.value()) {
                row.trial_expires_at = trial_expires_at;
            }
        }
    }

    pub fn has_tenant(&self, tenant_id: Uuid) -> bool {
        self.by_tenant.contains_key(&tenant_id)
    }

    /// Number of store reads so far
    #[allow(dead_code)]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.faults.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .by_tenant
            .get(&tenant_id)
            .and_then(|id| self.subscriptions.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        self.faults.check()?;
        if self.by_tenant.contains_key(&sub.tenant_id) {
            return Err(DbError::Conflict("subscription for tenant already exists".to_string()));
        }

        let now = Utc::now();
        let row = SubscriptionRow {
            id: sub.id,
            tenant_id: sub.tenant_id,
            tier: sub.tier,
            status: sub.status,
            trial_expires_at: sub.trial_expires_at,
            created_at: now,
            updated_at: now,
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> DbResult<Option<Change<SubscriptionRow>>> {
        self.faults.check()?;
        let Some(mut row) = self.subscriptions.get_mut(&id) else {
            return Ok(None);
        };

        let before = row.clone();
        let after = changes.apply(&before, Utc::now());
        *row = after.clone();
        Ok(Some(Change { before, after }))
    }
}

// =============================================================================
// Overrides
// =============================================================================

/// In-memory override repository for testing.
///
/// Enforces the tenant reference against a subscription repository.
#[derive(Clone)]
pub struct MockOverrideRepository {
    overrides: Arc<DashMap<(Uuid, String), OverrideRow>>,
    subscriptions: MockSubscriptionRepository,
    reads: Arc<AtomicUsize>,
    pub faults: FaultSwitch,
}

impl MockOverrideRepository {
    pub fn new(subscriptions: MockSubscriptionRepository) -> Self {
        Self {
            overrides: Arc::new(DashMap::new()),
            subscriptions,
            reads: Arc::new(AtomicUsize::new(0)),
            faults: FaultSwitch::default(),
        }
    }

    /// Insert a raw row directly, skipping validation
    #[allow(dead_code)]
    pub fn insert_raw(&self, tenant_id: Uuid, name: &str, value: &str) {
        let now = Utc::now();
        self.overrides.insert(
            (tenant_id, name.to_string()),
            OverrideRow {
                id: Uuid::new_v4(),
                tenant_id,
                name: name.to_string(),
                value: value.to_string(),
                created_by: Uuid::nil(),
                created_at: now,
                updated_at: now,
            },
        );
    }

    #[allow(dead_code)]
    pub fn get(&self, tenant_id: Uuid, name: &str) -> Option<OverrideRow> {
        self.overrides
            .get(&(tenant_id, name.to_string()))
            .map(|r| r.value().clone())
    }

    #[allow(dead_code)]
    pub fn count(&self) -> usize {
        self.overrides.len()
    }

    #[allow(dead_code)]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OverrideRepository for MockOverrideRepository {
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Vec<OverrideRow>> {
        self.faults.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<OverrideRow> = self
            .overrides
            .iter()
            .filter(|r| r.key().0 == tenant_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn upsert(&self, input: UpsertOverride) -> DbResult<Upserted> {
        self.faults.check()?;
        if !self.subscriptions.has_tenant(input.tenant_id) {
            return Err(DbError::NotFound);
        }

        let now = Utc::now();
        let key = (input.tenant_id, input.name.clone());
        let before = self.overrides.get(&key).map(|r| r.value().clone());

        let after = match &before {
            Some(existing) => OverrideRow {
                value: input.value,
                created_by: input.created_by,
                updated_at: now,
                ..existing.clone()
            },
            None => OverrideRow {
                id: input.id,
                tenant_id: input.tenant_id,
                name: input.name,
                value: input.value,
                created_by: input.created_by,
                created_at: now,
                updated_at: now,
            },
        };

        self.overrides.insert(key, after.clone());
        Ok(Upserted { before, after })
    }

    async fn delete(&self, tenant_id: Uuid, name: &str) -> DbResult<Option<OverrideRow>> {
        self.faults.check()?;
        Ok(self
            .overrides
            .remove(&(tenant_id, name.to_string()))
            .map(|(_, row)| row))
    }
}

// =============================================================================
// Audit
// =============================================================================

/// In-memory append-only audit repository for testing
#[derive(Default, Clone)]
pub struct MockAuditRepository {
    entries: Arc<DashMap<u64, AuditRow>>,
    sequence: Arc<AtomicU64>,
    pub faults: FaultSwitch,
}

impl MockAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, oldest first
    #[allow(dead_code)]
    pub fn entries(&self) -> Vec<AuditRow> {
        let mut entries: Vec<(u64, AuditRow)> = self
            .entries
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, row)| row).collect()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl AuditRepository for MockAuditRepository {
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditRow> {
        self.faults.check()?;
        let row = AuditRow {
            id: entry.id,
            actor_id: entry.actor_id,
            tenant_id: entry.tenant_id,
            action: entry.action,
            diff: entry.diff,
            created_at: Utc::now(),
        };
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(seq, row.clone());
        Ok(row)
    }

    async fn find_by_tenant_id(&self, tenant_id: Uuid, limit: i64) -> DbResult<Vec<AuditRow>> {
        self.faults.check()?;
        let mut rows: Vec<AuditRow> = self
            .entries()
            .into_iter()
            .filter(|row| row.tenant_id == Some(tenant_id))
            .collect();
        rows.reverse();
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

// =============================================================================
// Cache
// =============================================================================

/// In-memory cache that counts calls and can be switched off.
///
/// Entries live until invalidated; the TTL each was stored with is
/// recorded for assertions.
#[derive(Default, Clone)]
pub struct MockGrantCache {
    entries: Arc<DashMap<String, String>>,
    ttls: Arc<DashMap<String, Duration>>,
    gets: Arc<AtomicUsize>,
    puts: Arc<AtomicUsize>,
    invalidations: Arc<AtomicUsize>,
    down: Arc<AtomicBool>,
}

impl MockGrantCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn recover(&self) {
        self.down.store(false, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    #[allow(dead_code)]
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    #[allow(dead_code)]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.ttls.get(key).map(|r| *r.value())
    }

    #[allow(dead_code)]
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GrantCache for MockGrantCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries.insert(key.to_string(), value);
        self.ttls.insert(key.to_string(), ttl);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}
