//! Feature access policy tables.
//!
//! Two registries live here and are never merged:
//!
//! - **Gated features** ([`FeatureKey`]): a binary gate on a minimum tier.
//! - **Limited features** ([`LimitedFeatureKey`]): free/paid availability plus
//!   an optional per-tier numeric limit reported as metadata.
//!
//! A key string may belong to at most one of the two registries.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::EntitleError;
use crate::key::{FeatureKey, LimitedFeatureKey};
use crate::plan::PlanTier;

/// Registry entry for a gated feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatedFeature {
    pub key: FeatureKey,
    pub display_name: String,
    pub required_tier: PlanTier,
}

impl GatedFeature {
    pub fn new(key: impl Into<FeatureKey>, display_name: impl Into<String>, required_tier: PlanTier) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            required_tier,
        }
    }
}

/// Registry entry for a limited feature.
///
/// A tier missing from `limits` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitedFeature {
    pub key: LimitedFeatureKey,
    pub allowed_on_free: bool,
    pub allowed_on_paid: bool,
    pub limits: BTreeMap<PlanTier, u32>,
}

impl LimitedFeature {
    /// Entry with no numeric limits.
    pub fn new(key: impl Into<LimitedFeatureKey>, allowed_on_free: bool, allowed_on_paid: bool) -> Self {
        Self {
            key: key.into(),
            allowed_on_free,
            allowed_on_paid,
            limits: BTreeMap::new(),
        }
    }

    /// Builder: set the numeric limit for one tier.
    pub fn limit(mut self, tier: PlanTier, limit: u32) -> Self {
        self.limits.insert(tier, limit);
        self
    }

    /// Whether `tier` may use the feature at all.
    #[inline]
    pub fn allows(&self, tier: PlanTier) -> bool {
        if tier.is_paid() {
            self.allowed_on_paid
        } else {
            self.allowed_on_free
        }
    }
}

/// Static lookup tables deciding feature availability per tier.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FeatureAccessPolicy {
    gated: HashMap<FeatureKey, GatedFeature>,
    limited: HashMap<LimitedFeatureKey, LimitedFeature>,
}

impl FeatureAccessPolicy {
    /// Start building a policy.
    pub fn builder() -> FeatureAccessPolicyBuilder {
        FeatureAccessPolicyBuilder::default()
    }

    /// The registry compiled into the engine.
    pub fn builtin() -> Self {
        let gated = [
            GatedFeature::new("dashboard", "Dashboard", PlanTier::Free),
            GatedFeature::new("loan_tracking", "Loan tracking", PlanTier::Free),
            GatedFeature::new("study_sessions", "Study sessions", PlanTier::Free),
            GatedFeature::new("achievements", "Achievements", PlanTier::Free),
            GatedFeature::new("pdf_export", "PDF export", PlanTier::Pro),
            GatedFeature::new("ai_summaries", "AI summaries", PlanTier::Pro),
            GatedFeature::new("ai_content_generation", "AI content generation", PlanTier::Pro),
            GatedFeature::new("custom_themes", "Custom themes", PlanTier::Pro),
            GatedFeature::new("advanced_analytics", "Advanced analytics", PlanTier::Premium),
            GatedFeature::new("financial_forecasting", "Financial forecasting", PlanTier::Premium),
            GatedFeature::new("priority_support", "Priority support", PlanTier::Premium),
        ];
        let limited = [
            LimitedFeature::new("vocabulary_review", true, true)
                .limit(PlanTier::Free, 5)
                .limit(PlanTier::Pro, 10),
            LimitedFeature::new("flashcard_decks", true, true)
                .limit(PlanTier::Free, 3)
                .limit(PlanTier::Pro, 25),
            LimitedFeature::new("savings_goals", true, true)
                .limit(PlanTier::Free, 2)
                .limit(PlanTier::Pro, 10),
            LimitedFeature::new("ai_tutor_sessions", false, true).limit(PlanTier::Pro, 20),
            LimitedFeature::new("study_reminders", false, true),
        ];

        Self {
            gated: gated.into_iter().map(|f| (f.key.clone(), f)).collect(),
            limited: limited.into_iter().map(|f| (f.key.clone(), f)).collect(),
        }
    }

    /// Minimum tier for a gated feature.
    pub fn required_tier(&self, key: &FeatureKey) -> Result<PlanTier, EntitleError> {
        self.gated
            .get(key)
            .map(|f| f.required_tier)
            .ok_or_else(|| EntitleError::UnknownFeature(key.to_string()))
    }

    /// Whether `tier` passes the gate for `key`.
    pub fn can_access(&self, tier: PlanTier, key: &FeatureKey) -> Result<bool, EntitleError> {
        Ok(tier.satisfies(self.required_tier(key)?))
    }

    /// Whether `tier` may use a limited feature.
    pub fn can_access_limited(
        &self,
        tier: PlanTier,
        key: &LimitedFeatureKey,
    ) -> Result<bool, EntitleError> {
        Ok(self.limited_entry(key)?.allows(tier))
    }

    /// Numeric limit of a limited feature for `tier`; `None` means unbounded.
    pub fn limit(&self, tier: PlanTier, key: &LimitedFeatureKey) -> Result<Option<u32>, EntitleError> {
        Ok(self.limited_entry(key)?.limits.get(&tier).copied())
    }

    /// Look up a gated feature entry.
    pub fn gated_entry(&self, key: &FeatureKey) -> Option<&GatedFeature> {
        self.gated.get(key)
    }

    /// Look up a limited feature entry.
    pub fn limited_entry(&self, key: &LimitedFeatureKey) -> Result<&LimitedFeature, EntitleError> {
        self.limited
            .get(key)
            .ok_or_else(|| EntitleError::UnknownFeature(key.to_string()))
    }

    /// All gated features, sorted by key.
    pub fn gated_features(&self) -> Vec<&GatedFeature> {
        let mut features: Vec<_> = self.gated.values().collect();
        features.sort_by(|a, b| a.key.cmp(&b.key));
        features
    }

    /// All limited features, sorted by key.
    pub fn limited_features(&self) -> Vec<&LimitedFeature> {
        let mut features: Vec<_> = self.limited.values().collect();
        features.sort_by(|a, b| a.key.cmp(&b.key));
        features
    }

    /// Check the registry invariants.
    ///
    /// - no key appears in both registries
    /// - limited availability is monotonic (`allowed_on_free` implies `allowed_on_paid`)
    /// - limits never shrink from one granted tier to the next (absent = unbounded)
    pub fn validate(&self) -> Result<(), EntitleError> {
        for key in self.gated.keys() {
            if self.limited.contains_key(&LimitedFeatureKey::new(key.as_str())) {
                return Err(EntitleError::InvalidPolicy(format!(
                    "feature '{key}' is registered as both gated and limited"
                )));
            }
        }

        for feature in self.limited.values() {
            if feature.allowed_on_free && !feature.allowed_on_paid {
                return Err(EntitleError::InvalidPolicy(format!(
                    "limited feature '{}' is allowed on free but not on paid tiers",
                    feature.key
                )));
            }

            let granted: Vec<PlanTier> = PlanTier::ALL
                .into_iter()
                .filter(|t| feature.allows(*t))
                .collect();
            for pair in granted.windows(2) {
                let (lower, upper) = (pair[0], pair[1]);
                let shrinks = match (feature.limits.get(&lower), feature.limits.get(&upper)) {
                    (None, Some(_)) => true,
                    (Some(lo), Some(hi)) => hi < lo,
                    _ => false,
                };
                if shrinks {
                    return Err(EntitleError::InvalidPolicy(format!(
                        "limited feature '{}' has a smaller limit on {upper} than on {lower}",
                        feature.key
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Builder that rejects duplicate keys and invalid tables.
#[derive(Debug, Default)]
pub struct FeatureAccessPolicyBuilder {
    gated: Vec<GatedFeature>,
    limited: Vec<LimitedFeature>,
}

impl FeatureAccessPolicyBuilder {
    /// Register a gated feature.
    pub fn gate(mut self, feature: GatedFeature) -> Self {
        self.gated.push(feature);
        self
    }

    /// Register a limited feature.
    pub fn limited(mut self, feature: LimitedFeature) -> Self {
        self.limited.push(feature);
        self
    }

    /// Build and validate the policy.
    pub fn build(self) -> Result<FeatureAccessPolicy, EntitleError> {
        let mut policy = FeatureAccessPolicy::default();

        for feature in self.gated {
            if policy.gated.contains_key(&feature.key) {
                return Err(EntitleError::InvalidPolicy(format!(
                    "duplicate gated feature '{}'",
                    feature.key
                )));
            }
            policy.gated.insert(feature.key.clone(), feature);
        }
        for feature in self.limited {
            if policy.limited.contains_key(&feature.key) {
                return Err(EntitleError::InvalidPolicy(format!(
                    "duplicate limited feature '{}'",
                    feature.key
                )));
            }
            policy.limited.insert(feature.key.clone(), feature);
        }

        policy.validate()?;
        Ok(policy)
    }
}
