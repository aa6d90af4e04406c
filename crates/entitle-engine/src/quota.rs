//! Daily quota policy for metered actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EntitleError;
use crate::key::MeteredFeatureKind;
use crate::plan::PlanTier;

/// Per-tier number of admissions per UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAllowance {
    pub free: u32,
    pub pro: u32,
    pub premium: u32,
}

impl DailyAllowance {
    pub const fn new(free: u32, pro: u32, premium: u32) -> Self {
        Self { free, pro, premium }
    }

    /// Allowance for `tier`.
    #[inline]
    pub fn for_tier(&self, tier: PlanTier) -> u32 {
        match tier {
            PlanTier::Free => self.free,
            PlanTier::Pro => self.pro,
            PlanTier::Premium => self.premium,
        }
    }
}

/// Static table of daily allowances, keyed by metered kind.
#[derive(Debug, Clone, Default)]
pub struct QuotaPolicy {
    allowances: HashMap<MeteredFeatureKind, DailyAllowance>,
}

impl QuotaPolicy {
    /// Build from `(kind, allowance)` pairs, rejecting duplicates and
    /// allowances that shrink as the tier rises.
    pub fn new<I, K>(entries: I) -> Result<Self, EntitleError>
    where
        I: IntoIterator<Item = (K, DailyAllowance)>,
        K: Into<MeteredFeatureKind>,
    {
        let mut allowances = HashMap::new();
        for (kind, allowance) in entries {
            let kind = kind.into();
            if allowances.contains_key(&kind) {
                return Err(EntitleError::InvalidPolicy(format!(
                    "duplicate metered kind '{kind}'"
                )));
            }
            allowances.insert(kind, allowance);
        }
        let policy = Self { allowances };
        policy.validate()?;
        Ok(policy)
    }

    /// The table compiled into the engine.
    pub fn builtin() -> Self {
        let allowances = [
            ("content_generation", DailyAllowance::new(3, 12, 50)),
            ("ai_summary", DailyAllowance::new(2, 20, 100)),
            ("pdf_report", DailyAllowance::new(1, 10, 30)),
            ("flashcard_generation", DailyAllowance::new(5, 30, 100)),
        ];
        Self {
            allowances: allowances
                .into_iter()
                .map(|(kind, allowance)| (MeteredFeatureKind::from(kind), allowance))
                .collect(),
        }
    }

    /// Daily limit of `kind` for `tier`.
    pub fn daily_limit(&self, tier: PlanTier, kind: &MeteredFeatureKind) -> Result<u32, EntitleError> {
        self.allowances
            .get(kind)
            .map(|a| a.for_tier(tier))
            .ok_or_else(|| EntitleError::UnknownFeature(kind.to_string()))
    }

    /// All metered kinds with their allowances, sorted by kind.
    pub fn entries(&self) -> Vec<(&MeteredFeatureKind, &DailyAllowance)> {
        let mut entries: Vec<_> = self.allowances.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Check that no allowance decreases with tier.
    pub fn validate(&self) -> Result<(), EntitleError> {
        for (kind, allowance) in &self.allowances {
            if allowance.free > allowance.pro || allowance.pro > allowance.premium {
                return Err(EntitleError::InvalidPolicy(format!(
                    "metered kind '{kind}' allowance decreases with tier"
                )));
            }
        }
        Ok(())
    }
}
