//! Engine metrics.
//!
//! # Metrics
//!
//! - `tollgate_resolutions_total` - Counter of resolutions by outcome source
//! - `tollgate_resolution_duration_seconds` - Histogram of read latencies
//! - `tollgate_cache_hits` / `tollgate_cache_misses` - Cache lookups
//! - `tollgate_cache_errors_total` - Cache backend faults by operation
//! - `tollgate_store_faults_total` - Store faults on the read path by policy
//! - `tollgate_audit_failures_total` - Audit appends lost after a commit
//!
//! Recorded through the `metrics` facade; nothing is exported unless a
//! recorder is installed.

use std::time::Instant;

use metrics::{counter, histogram};

use crate::resolver::GrantSource;

/// Metric name for resolutions by source.
pub const RESOLUTIONS_TOTAL: &str = "tollgate_resolutions_total";

/// Metric name for read latency histogram.
pub const RESOLUTION_DURATION_SECONDS: &str = "tollgate_resolution_duration_seconds";

/// Metric name for cache hits.
pub const CACHE_HITS: &str = "tollgate_cache_hits";

/// Metric name for cache misses.
pub const CACHE_MISSES: &str = "tollgate_cache_misses";

/// Metric name for cache backend faults.
pub const CACHE_ERRORS_TOTAL: &str = "tollgate_cache_errors_total";

/// Metric name for store faults on the read path.
pub const STORE_FAULTS_TOTAL: &str = "tollgate_store_faults_total";

/// Metric name for lost audit entries.
pub const AUDIT_FAILURES_TOTAL: &str = "tollgate_audit_failures_total";

/// Cache operations for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Get,
    Put,
    Invalidate,
    Decode,
}

impl CacheOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Invalidate => "invalidate",
            Self::Decode => "decode",
        }
    }
}

pub(crate) fn record_resolution(source: GrantSource) {
    counter!(RESOLUTIONS_TOTAL, "source" => source.as_str()).increment(1);
}

pub(crate) fn record_cache_hit(operation: &'static str) {
    counter!(CACHE_HITS, "operation" => operation).increment(1);
}

pub(crate) fn record_cache_miss(operation: &'static str) {
    counter!(CACHE_MISSES, "operation" => operation).increment(1);
}

pub(crate) fn record_cache_error(op: CacheOp) {
    counter!(CACHE_ERRORS_TOTAL, "operation" => op.as_str()).increment(1);
}

pub(crate) fn record_store_fault(policy: &'static str) {
    counter!(STORE_FAULTS_TOTAL, "policy" => policy).increment(1);
}

pub(crate) fn record_audit_failure(action: &str) {
    counter!(AUDIT_FAILURES_TOTAL, "action" => action.to_string()).increment(1);
}

/// Times one read; `finish` records it.
#[derive(Debug)]
pub(crate) struct ReadTimer {
    operation: &'static str,
    start: Instant,
}

impl ReadTimer {
    pub(crate) fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        histogram!(RESOLUTION_DURATION_SECONDS, "operation" => self.operation).record(elapsed);
        elapsed
    }
}

/// Describe all metrics for registration with a recorder.
///
/// ```ignore
/// tollgate_core::metrics::describe_metrics();
/// ```
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram, Unit};

    describe_counter!(
        RESOLUTIONS_TOTAL,
        Unit::Count,
        "Entitlement resolutions by the precedence layer that decided them"
    );

    describe_histogram!(
        RESOLUTION_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of entitlement reads in seconds"
    );

    describe_counter!(CACHE_HITS, Unit::Count, "Permissions cache hits");

    describe_counter!(CACHE_MISSES, Unit::Count, "Permissions cache misses");

    describe_counter!(
        CACHE_ERRORS_TOTAL,
        Unit::Count,
        "Permissions cache faults recovered from locally"
    );

    describe_counter!(
        STORE_FAULTS_TOTAL,
        Unit::Count,
        "Subscription or override store faults on the read path"
    );

    describe_counter!(
        AUDIT_FAILURES_TOTAL,
        Unit::Count,
        "Audit entries that could not be written after a committed mutation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_op_names() {
        assert_eq!(CacheOp::Get.as_str(), "get");
        assert_eq!(CacheOp::Put.as_str(), "put");
        assert_eq!(CacheOp::Invalidate.as_str(), "invalidate");
        assert_eq!(CacheOp::Decode.as_str(), "decode");
    }

    #[test]
    fn test_read_timer_measures_elapsed() {
        let timer = ReadTimer::start("test");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.finish() >= 0.005);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_resolution(GrantSource::Tier);
        record_cache_error(CacheOp::Get);
        record_audit_failure("override.set");
    }
}
