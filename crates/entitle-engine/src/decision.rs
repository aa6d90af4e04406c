//! Authorization decision value object.

use std::fmt;

use serde::Serialize;

use crate::plan::PlanTier;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Access granted.
    Granted,
    /// The user's tier is below what the feature requires.
    PlanInsufficient,
    /// Today's allowance for the metered action is used up.
    QuotaExceeded,
    /// The quota store failed or timed out; denied rather than guessed.
    QuotaUnavailable,
}

impl DecisionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::PlanInsufficient => "plan_insufficient",
            Self::QuotaExceeded => "quota_exceeded",
            Self::QuotaUnavailable => "quota_unavailable",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one authorization call.
///
/// Built fresh per call and never persisted. `remaining`, when present, is
/// never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_plan: Option<PlanTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Decision {
    /// Plain grant with no metadata.
    #[inline]
    pub fn granted() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted,
            required_plan: None,
            remaining: None,
            limit: None,
        }
    }

    /// Grant carrying a numeric limit (absent limit means unbounded).
    #[inline]
    pub fn granted_with_limit(limit: Option<u32>) -> Self {
        Self {
            limit,
            ..Self::granted()
        }
    }

    /// Grant of a metered action after `used` admissions out of `limit`.
    #[inline]
    pub fn within_quota(used: u32, limit: u32) -> Self {
        Self {
            remaining: Some(remaining(limit, used)),
            limit: Some(limit),
            ..Self::granted()
        }
    }

    /// Denial because the tier is too low.
    #[inline]
    pub fn plan_insufficient(required_plan: Option<PlanTier>) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::PlanInsufficient,
            required_plan,
            remaining: None,
            limit: None,
        }
    }

    /// Denial because today's allowance is exhausted.
    #[inline]
    pub fn quota_exceeded(limit: u32) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::QuotaExceeded,
            required_plan: None,
            remaining: Some(0),
            limit: Some(limit),
        }
    }

    /// Denial because the quota store could not answer.
    #[inline]
    pub fn quota_unavailable(limit: u32) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::QuotaUnavailable,
            required_plan: None,
            remaining: None,
            limit: Some(limit),
        }
    }
}

/// `max(limit - used, 0)`.
#[inline]
pub fn remaining(limit: u32, used: u32) -> u32 {
    limit.saturating_sub(used)
}
