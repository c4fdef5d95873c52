//! Application state for the Entitlement API service.

use std::sync::Arc;

use tollgate_core::{AdminService, EntitlementService, GrantCache, MokaGrantCache, Resolver};
use tollgate_db::pg::{PgAuditRepository, PgOverrideRepository, PgSubscriptionRepository};
use tollgate_db::{DbPool, Repositories};
use tollgate_types::TierCatalog;

use crate::config::Config;

pub type Entitlements = EntitlementService<PgSubscriptionRepository, PgOverrideRepository>;
pub type Admin = AdminService<PgSubscriptionRepository, PgOverrideRepository, PgAuditRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Cached entitlement reads
    pub entitlements: Arc<Entitlements>,
    /// Subscription and override administration
    pub admin: Arc<Admin>,
    /// Database pool (readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the engine over PostgreSQL repositories
    pub fn new(pool: DbPool, catalog: TierCatalog, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());
        let subscriptions = Arc::new(repos.subscriptions);
        let overrides = Arc::new(repos.overrides);

        let cache: Option<Arc<dyn GrantCache>> = if config.cache_enabled {
            Some(Arc::new(MokaGrantCache::from_config(&config.engine)))
        } else {
            None
        };

        let resolver = Resolver::new(
            Arc::clone(&subscriptions),
            Arc::clone(&overrides),
            Arc::new(catalog),
        );
        let entitlements = Arc::new(EntitlementService::new(
            resolver,
            cache,
            config.engine.clone(),
        ));
        let admin = AdminService::new(
            subscriptions,
            overrides,
            Arc::new(repos.audit),
            Arc::clone(&entitlements),
        );

        Self {
            entitlements,
            admin: Arc::new(admin),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
