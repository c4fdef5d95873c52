//! Common test utilities for tollgate-core integration tests

pub mod mock_repos;

use std::sync::Arc;

use tollgate_core::{AdminService, EngineConfig, EntitlementService, GrantCache, Resolver};
use tollgate_types::{ActorId, TierCatalog};
use uuid::Uuid;

#[allow(unused_imports)]
pub use mock_repos::{
    FaultSwitch, MockAuditRepository, MockGrantCache, MockOverrideRepository,
    MockSubscriptionRepository,
};

pub type TestEntitlements = EntitlementService<MockSubscriptionRepository, MockOverrideRepository>;
pub type TestAdmin =
    AdminService<MockSubscriptionRepository, MockOverrideRepository, MockAuditRepository>;

/// Read and admin services wired to shared in-memory stores
#[allow(dead_code)]
pub struct Harness {
    pub subscriptions: Arc<MockSubscriptionRepository>,
    pub overrides: Arc<MockOverrideRepository>,
    pub audit: Arc<MockAuditRepository>,
    pub cache: MockGrantCache,
    pub entitlements: Arc<TestEntitlements>,
    pub admin: TestAdmin,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), true)
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(config, true)
    }

    pub fn without_cache() -> Self {
        Self::build(EngineConfig::default(), false)
    }

    /// Wire services to an arbitrary cache backend
    pub fn with_cache(cache: Arc<dyn GrantCache>, config: EngineConfig) -> Self {
        let mut harness = Self::build(config.clone(), false);
        let resolver = harness.entitlements.resolver().clone();
        harness.entitlements = Arc::new(EntitlementService::new(resolver, Some(cache), config));
        harness.admin = AdminService::new(
            Arc::clone(&harness.subscriptions),
            Arc::clone(&harness.overrides),
            Arc::clone(&harness.audit),
            Arc::clone(&harness.entitlements),
        );
        harness
    }

    fn build(config: EngineConfig, cached: bool) -> Self {
        let subscriptions = MockSubscriptionRepository::new();
        let overrides = Arc::new(MockOverrideRepository::new(subscriptions.clone()));
        let subscriptions = Arc::new(subscriptions);
        let audit = Arc::new(MockAuditRepository::new());
        let cache = MockGrantCache::new();

        let resolver = Resolver::new(
            Arc::clone(&subscriptions),
            Arc::clone(&overrides),
            Arc::new(TierCatalog::standard()),
        );
        let backend: Option<Arc<dyn GrantCache>> = if cached {
            Some(Arc::new(cache.clone()))
        } else {
            None
        };
        let entitlements = Arc::new(EntitlementService::new(resolver, backend, config));
        let admin = AdminService::new(
            Arc::clone(&subscriptions),
            Arc::clone(&overrides),
            Arc::clone(&audit),
            Arc::clone(&entitlements),
        );

        Self {
            subscriptions,
            overrides,
            audit,
            cache,
            entitlements,
            admin,
        }
    }
}

#[allow(dead_code)]
pub fn actor() -> ActorId {
    ActorId(Uuid::new_v4())
}
