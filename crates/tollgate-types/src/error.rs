//! Common error types

use thiserror::Error;

/// Errors converting boundary strings into typed values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Tier outside the closed tier set
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    /// Status outside the closed status set
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Name outside the feature and limit allow-lists
    #[error("unknown feature name: {0}")]
    UnknownName(String),

    /// Value that does not parse for the name's kind
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Feature or limit name
        name: String,
        /// Raw value as supplied
        value: String,
    },
}
