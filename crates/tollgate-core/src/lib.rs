//! Tollgate Core - Entitlement resolution engine
//!
//! Resolves which features and limits a tenant is entitled to from its
//! subscription tier, per-tenant overrides and trial state. Reads go through
//! a TTL cache; admin mutations commit, then invalidate, then audit.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate_core::{EngineConfig, EntitlementService, MokaGrantCache, Resolver};
//!
//! let config = EngineConfig::default();
//! let resolver = Resolver::new(subscriptions, overrides, Arc::new(TierCatalog::standard()));
//! let cache = Arc::new(MokaGrantCache::from_config(&config));
//! let service = EntitlementService::new(resolver, Some(cache), config);
//!
//! let allowed = service.check_feature(&tenant_id, "payroll", false).await?;
//! ```

pub mod admin;
pub mod audit;
pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod service;

pub use admin::{AdminService, UpdateSubscription, MAX_AUDIT_ENTRIES};
pub use audit::AuditLog;
pub use cache::{cache_key, CacheError, GrantCache, MokaGrantCache};
pub use config::{EngineConfig, StoreFaultPolicy};
pub use device::{Admission, DeviceAdmission};
pub use error::EngineError;
pub use resolver::{apply_overrides, resolve_grant, GrantSource, Resolution, Resolver};
pub use service::EntitlementService;
