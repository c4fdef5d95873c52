//! Tollgate Types - Shared domain types
//!
//! This crate contains domain types used across the entitlement engine:
//! - Tiers and the tier catalog
//! - Feature and limit allow-lists, override values
//! - Subscriptions, resolved grants and the permissions snapshot
//! - Audit entries

pub mod audit;
pub mod catalog;
pub mod error;
pub mod feature;
pub mod grant;
pub mod overrides;
pub mod subscription;
pub mod tenant;
pub mod tier;

pub use audit::*;
pub use catalog::*;
pub use error::*;
pub use feature::*;
pub use grant::*;
pub use overrides::*;
pub use subscription::*;
pub use tenant::*;
pub use tier::*;
