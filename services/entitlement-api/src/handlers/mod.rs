//! REST API handlers

pub mod admin;
pub mod health;
pub mod permissions;
pub mod shared;

pub use admin::*;
pub use health::*;
pub use permissions::*;
