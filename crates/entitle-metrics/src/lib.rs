//! Metrics instrumentation for entitle.
//!
//! Recording goes through the `metrics` facade; installing an exporter
//! (Prometheus, StatsD, ...) is left to the host process. Without a
//! recorder installed every call here is a no-op.

use metrics::{counter, histogram};

// ============================================================================
// Metric Names
// ============================================================================

/// Total authorization decisions, labelled by request family and reason.
pub const DECISIONS_TOTAL: &str = "entitle_decisions_total";
/// Total quota store failures, labelled by error class.
pub const STORE_ERRORS_TOTAL: &str = "entitle_store_errors_total";
/// Quota store round-trip latency histogram (seconds).
pub const STORE_LATENCY_SECONDS: &str = "entitle_store_latency_seconds";
/// Total fail-closed plan resolutions (unknown status or lookup failure).
pub const PLAN_FALLBACKS_TOTAL: &str = "entitle_plan_fallbacks_total";

// ============================================================================
// Request Families
// ============================================================================

/// Binary plan gate.
pub const FAMILY_FEATURE: &str = "feature";
/// Boolean availability plus optional numeric limit.
pub const FAMILY_LIMITED: &str = "limited";
/// Daily metered consumption.
pub const FAMILY_METERED: &str = "metered";
/// Read-only quota lookup.
pub const FAMILY_PEEK: &str = "peek";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a decision (family: one of the `FAMILY_*` constants).
#[inline]
pub fn record_decision(family: &'static str, reason: &'static str) {
    counter!(DECISIONS_TOTAL, "family" => family, "reason" => reason).increment(1);
}

/// Record a quota store failure by error class.
#[inline]
pub fn record_store_error(kind: &'static str) {
    counter!(STORE_ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Record quota store round-trip latency.
#[inline]
pub fn record_store_latency(duration_secs: f64) {
    histogram!(STORE_LATENCY_SECONDS).record(duration_secs);
}

/// Record a plan resolution that fell back to the lowest tier.
#[inline]
pub fn record_plan_fallback() {
    counter!(PLAN_FALLBACKS_TOTAL).increment(1);
}

// ============================================================================
// Error Type Constants (re-exported from entitle-core)
// ============================================================================

pub use entitle_core::{
    ERROR_INVALID_POLICY, ERROR_QUOTA_UNAVAILABLE, ERROR_TIMEOUT, ERROR_UNKNOWN_FEATURE,
    ERROR_UNKNOWN_PLAN_STATUS,
};
