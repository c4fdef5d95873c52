//! Device admission against the resolved `max_devices` limit

use serde_json::json;
use tollgate_types::LimitValue;

/// Outcome of a device registration check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Deny {
        /// Resolved limit at decision time
        limit: u64,
        /// Active devices already registered
        active: u64,
    },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }

    /// Response body; denials carry the limit and active count
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Admit => json!({ "admitted": true }),
            Self::Deny { limit, active } => json!({
                "admitted": false,
                "limit": limit,
                "active_devices": active,
            }),
        }
    }
}

/// Admit/deny decision for a new device
pub struct DeviceAdmission;

impl DeviceAdmission {
    /// A new device is admitted while `active_devices < limit`
    pub fn check(limit: LimitValue, active_devices: u64) -> Admission {
        match limit {
            LimitValue::Limited(max) if !limit.allows(active_devices) => Admission::Deny {
                limit: max,
                active: active_devices,
            },
            _ => Admission::Admit,
        }
    }
}
