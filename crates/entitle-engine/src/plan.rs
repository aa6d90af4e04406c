//! Plan tiers and subscription status resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EntitleError;

/// Canonical billing tier.
///
/// Variants are declared in ascending order, so the derived `Ord` is the
/// tier ordering used by every access comparison: `Free < Pro < Premium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Premium,
}

impl PlanTier {
    /// Every tier, lowest first.
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Pro, PlanTier::Premium];

    /// Lowercase identifier used in config files and status strings.
    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }

    /// Whether this tier is billed.
    #[inline]
    pub fn is_paid(self) -> bool {
        self != PlanTier::Free
    }

    /// Whether this tier meets `required`.
    #[inline]
    pub fn satisfies(self, required: PlanTier) -> bool {
        self >= required
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = EntitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "premium" => Ok(PlanTier::Premium),
            _ => Err(EntitleError::UnknownPlanStatus(s.to_string())),
        }
    }
}

/// Subscription status as reported by the billing system.
///
/// Parsing never fails: unrecognized input is kept as [`Other`](Self::Other)
/// and rejected at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSubscriptionStatus {
    Free,
    Pro,
    Premium,
    /// Trial, optionally naming the tier being trialed (`trial:premium`).
    Trial(Option<PlanTier>),
    Lifetime,
    Other(String),
}

impl RawSubscriptionStatus {
    /// Parse a status string, case-insensitively.
    pub fn parse(s: &str) -> Self {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "free" => Self::Free,
            "pro" => Self::Pro,
            "premium" => Self::Premium,
            "lifetime" => Self::Lifetime,
            "trial" => Self::Trial(None),
            other => match other.strip_prefix("trial:") {
                Some(target) => match target.parse::<PlanTier>() {
                    Ok(tier) => Self::Trial(Some(tier)),
                    Err(_) => Self::Other(s.to_string()),
                },
                None => Self::Other(s.to_string()),
            },
        }
    }
}

impl From<&str> for RawSubscriptionStatus {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<PlanTier> for RawSubscriptionStatus {
    fn from(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => Self::Free,
            PlanTier::Pro => Self::Pro,
            PlanTier::Premium => Self::Premium,
        }
    }
}

impl fmt::Display for RawSubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => f.write_str("free"),
            Self::Pro => f.write_str("pro"),
            Self::Premium => f.write_str("premium"),
            Self::Lifetime => f.write_str("lifetime"),
            Self::Trial(None) => f.write_str("trial"),
            Self::Trial(Some(tier)) => write!(f, "trial:{tier}"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Maps raw subscription statuses onto [`PlanTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanResolver {
    trial_default: PlanTier,
}

impl PlanResolver {
    /// Resolver whose untargeted trials resolve to `tier`.
    pub fn with_trial_default(tier: PlanTier) -> Self {
        Self {
            trial_default: tier,
        }
    }

    /// Tier used for trials that do not name a target.
    pub fn trial_default(&self) -> PlanTier {
        self.trial_default
    }

    /// Resolve a raw status.
    ///
    /// Fails only with [`EntitleError::UnknownPlanStatus`].
    pub fn resolve(&self, raw: &RawSubscriptionStatus) -> Result<PlanTier, EntitleError> {
        match raw {
            RawSubscriptionStatus::Free => Ok(PlanTier::Free),
            RawSubscriptionStatus::Pro => Ok(PlanTier::Pro),
            RawSubscriptionStatus::Premium | RawSubscriptionStatus::Lifetime => {
                Ok(PlanTier::Premium)
            }
            RawSubscriptionStatus::Trial(target) => Ok(target.unwrap_or(self.trial_default)),
            RawSubscriptionStatus::Other(s) => Err(EntitleError::UnknownPlanStatus(s.clone())),
        }
    }

    /// Resolve a raw status, treating anything unrecognized as `Free`.
    pub fn resolve_or_free(&self, raw: &RawSubscriptionStatus) -> PlanTier {
        match self.resolve(raw) {
            Ok(tier) => tier,
            Err(e) => {
                warn!(error = %e, "plan resolution failed, treating user as free");
                entitle_metrics::record_plan_fallback();
                PlanTier::Free
            }
        }
    }
}

impl Default for PlanResolver {
    fn default() -> Self {
        Self::with_trial_default(PlanTier::Pro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_total_order() {
        assert!(PlanTier::Free < PlanTier::Pro);
        assert!(PlanTier::Pro < PlanTier::Premium);
        let mut sorted = PlanTier::ALL;
        sorted.sort();
        assert_eq!(sorted, PlanTier::ALL);
        assert!(PlanTier::Premium.satisfies(PlanTier::Pro));
        assert!(!PlanTier::Free.satisfies(PlanTier::Pro));
    }

    #[test]
    fn test_tier_parse_and_display() {
        for tier in PlanTier::ALL {
            assert_eq!(tier.to_string().parse::<PlanTier>().unwrap(), tier);
        }
        assert_eq!(" PRO ".parse::<PlanTier>().unwrap(), PlanTier::Pro);
        assert!("gold".parse::<PlanTier>().is_err());
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlanTier::Premium).unwrap(), "\"premium\"");
        let tier: PlanTier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(tier, PlanTier::Pro);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(RawSubscriptionStatus::parse("Lifetime"), RawSubscriptionStatus::Lifetime);
        assert_eq!(RawSubscriptionStatus::parse("trial"), RawSubscriptionStatus::Trial(None));
        assert_eq!(
            RawSubscriptionStatus::parse("trial:premium"),
            RawSubscriptionStatus::Trial(Some(PlanTier::Premium))
        );
        assert_eq!(
            RawSubscriptionStatus::parse("trial:gold"),
            RawSubscriptionStatus::Other("trial:gold".into())
        );
        assert_eq!(
            RawSubscriptionStatus::parse("enterprise"),
            RawSubscriptionStatus::Other("enterprise".into())
        );
    }

    #[test]
    fn test_resolve_mapping() {
        let resolver = PlanResolver::default();
        let cases = [
            ("free", PlanTier::Free),
            ("pro", PlanTier::Pro),
            ("premium", PlanTier::Premium),
            ("lifetime", PlanTier::Premium),
            ("trial", PlanTier::Pro),
            ("trial:premium", PlanTier::Premium),
            ("trial:free", PlanTier::Free),
        ];
        for (raw, expected) in cases {
            let status = RawSubscriptionStatus::parse(raw);
            assert_eq!(resolver.resolve(&status).unwrap(), expected, "status {raw}");
        }
    }

    #[test]
    fn test_trial_default_is_configurable() {
        let resolver = PlanResolver::with_trial_default(PlanTier::Premium);
        assert_eq!(
            resolver.resolve(&RawSubscriptionStatus::Trial(None)).unwrap(),
            PlanTier::Premium
        );
    }

    #[test]
    fn test_unknown_status_fails_closed() {
        let resolver = PlanResolver::default();
        let status = RawSubscriptionStatus::parse("cancelled");
        assert!(matches!(
            resolver.resolve(&status),
            Err(EntitleError::UnknownPlanStatus(s)) if s == "cancelled"
        ));
        assert_eq!(resolver.resolve_or_free(&status), PlanTier::Free);
    }
}
