//! Authorization request shapes.

use crate::key::{FeatureKey, LimitedFeatureKey, MeteredFeatureKind};

/// One of the three things a caller may ask the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequest {
    /// Binary plan gate.
    Feature(FeatureKey),
    /// Availability check; `report_limit` attaches the tier's numeric limit.
    Limited {
        key: LimitedFeatureKey,
        report_limit: bool,
    },
    /// Check-and-consume one slot of today's allowance.
    Metered(MeteredFeatureKind),
}

impl AccessRequest {
    #[inline]
    pub fn feature(key: impl Into<FeatureKey>) -> Self {
        Self::Feature(key.into())
    }

    /// Limited-feature check that reports the numeric limit.
    #[inline]
    pub fn limited(key: impl Into<LimitedFeatureKey>) -> Self {
        Self::Limited {
            key: key.into(),
            report_limit: true,
        }
    }

    /// Limited-feature check with availability only.
    #[inline]
    pub fn limited_availability(key: impl Into<LimitedFeatureKey>) -> Self {
        Self::Limited {
            key: key.into(),
            report_limit: false,
        }
    }

    #[inline]
    pub fn metered(kind: impl Into<MeteredFeatureKind>) -> Self {
        Self::Metered(kind.into())
    }

    /// Metrics label for the request family.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Feature(_) => entitle_metrics::FAMILY_FEATURE,
            Self::Limited { .. } => entitle_metrics::FAMILY_LIMITED,
            Self::Metered(_) => entitle_metrics::FAMILY_METERED,
        }
    }
}
