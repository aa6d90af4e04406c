//! Error class labels for metrics and logging.
//!
//! These constants provide consistent error classification across all crates.

/// Raw subscription status could not be mapped to a tier.
pub const ERROR_UNKNOWN_PLAN_STATUS: &str = "unknown_plan_status";
/// Feature or metered kind missing from the registry.
pub const ERROR_UNKNOWN_FEATURE: &str = "unknown_feature";
/// Quota store failed or did not answer.
pub const ERROR_QUOTA_UNAVAILABLE: &str = "quota_unavailable";
/// Quota store call exceeded its deadline.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Policy table rejected at construction.
pub const ERROR_INVALID_POLICY: &str = "invalid_policy";
