//! Tollgate DB - Database abstractions
//!
//! SQLx-based persistence for subscriptions, overrides and the audit log.
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_db::{create_pool, run_migrations, Repositories, SubscriptionRepository};
//!
//! let pool = create_pool("postgres://localhost/tollgate").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let sub = repos.subscriptions.find_by_tenant_id(tenant_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
