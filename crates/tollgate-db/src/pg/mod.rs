//! PostgreSQL repository implementations

mod audit;
mod overrides;
mod subscription;

pub use audit::PgAuditRepository;
pub use overrides::PgOverrideRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub overrides: PgOverrideRepository,
    pub audit: PgAuditRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            overrides: PgOverrideRepository::new(pool.clone()),
            audit: PgAuditRepository::new(pool),
        }
    }
}
