//! Entitlement error types.

use entitle_core::{
    ERROR_INVALID_POLICY, ERROR_QUOTA_UNAVAILABLE, ERROR_UNKNOWN_FEATURE, ERROR_UNKNOWN_PLAN_STATUS,
};

/// Entitlement engine error.
///
/// Only [`EntitleError::UnknownFeature`] ever escapes an authorization call.
/// The other variants are folded into a [`Decision`](crate::Decision) or
/// raised while building policies.
#[derive(Debug, thiserror::Error)]
pub enum EntitleError {
    /// Raw subscription status does not map to any tier.
    #[error("unknown plan status: {0}")]
    UnknownPlanStatus(String),

    /// Feature key or metered kind is not registered.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// Quota store error (database, network, timeout).
    #[error("quota store unavailable: {0}")]
    QuotaUnavailable(String),

    /// Policy table violates a registry invariant.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

impl EntitleError {
    /// Create a store error from any error type.
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::QuotaUnavailable(err.to_string())
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPlanStatus(_) => ERROR_UNKNOWN_PLAN_STATUS,
            Self::UnknownFeature(_) => ERROR_UNKNOWN_FEATURE,
            Self::QuotaUnavailable(_) => ERROR_QUOTA_UNAVAILABLE,
            Self::InvalidPolicy(_) => ERROR_INVALID_POLICY,
        }
    }
}

#[cfg(feature = "sql")]
impl From<sqlx::Error> for EntitleError {
    fn from(err: sqlx::Error) -> Self {
        Self::backend(err)
    }
}
