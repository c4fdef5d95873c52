//! Engine errors

use thiserror::Error;
use tollgate_types::ParseError;

/// Errors surfaced by the entitlement engine.
///
/// Cache faults never appear here; the read path recovers from them locally.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Referenced subscription or override does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Tenant already has a subscription
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Tier outside the catalog
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    /// Status outside the status set
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Name outside the feature/limit allow-lists
    #[error("unknown feature name: {0}")]
    UnknownFeatureName(String),

    /// Override value that does not fit the name's kind
    #[error("invalid value {value:?} for {name}")]
    InvalidOverrideValue {
        /// Feature or limit name
        name: String,
        /// Value as supplied
        value: String,
    },

    /// Subscription or override store could not be read or written
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl EngineError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::InvalidTier(_)
            | Self::InvalidStatus(_)
            | Self::UnknownFeatureName(_)
            | Self::InvalidOverrideValue { .. } => 400,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidTier(_) => "INVALID_TIER",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::UnknownFeatureName(_) => "UNKNOWN_FEATURE_NAME",
            Self::InvalidOverrideValue { .. } => "INVALID_OVERRIDE_VALUE",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidTier(tier) => Self::InvalidTier(tier),
            ParseError::InvalidStatus(status) => Self::InvalidStatus(status),
            ParseError::UnknownName(name) => Self::UnknownFeatureName(name),
            ParseError::InvalidValue { name, value } => Self::InvalidOverrideValue { name, value },
        }
    }
}

impl From<tollgate_db::DbError> for EngineError {
    fn from(err: tollgate_db::DbError) -> Self {
        match err {
            tollgate_db::DbError::NotFound => Self::NotFound("record".to_string()),
            tollgate_db::DbError::Conflict(what) => Self::AlreadyExists(what),
            tollgate_db::DbError::Sqlx(err) => {
                tracing::error!(error = %err, "Store error");
                Self::StoreUnavailable(err.to_string())
            }
        }
    }
}
