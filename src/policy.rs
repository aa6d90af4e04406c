//! Build engine policies from configuration.
//!
//! A family left empty in the config keeps its built-in table.

use entitle_config::{Config, EngineConfig, PolicyConfig};
use entitle_engine::{
    DailyAllowance, EntitleError, FeatureAccessPolicy, GatedFeature, LimitedFeature, PlanResolver,
    PlanTier, QuotaPolicy,
};

fn tier(field: &str, name: &str) -> Result<PlanTier, EntitleError> {
    name.parse::<PlanTier>()
        .map_err(|_| EntitleError::InvalidPolicy(format!("{field}: unknown tier '{name}'")))
}

/// Gated and limited registries.
pub fn feature_policy(config: &PolicyConfig) -> Result<FeatureAccessPolicy, EntitleError> {
    if config.features.is_empty() && config.limited.is_empty() {
        return Ok(FeatureAccessPolicy::builtin());
    }

    let builtin = FeatureAccessPolicy::builtin();
    let mut builder = FeatureAccessPolicy::builder();

    if config.features.is_empty() {
        for f in builtin.gated_features() {
            builder = builder.gate(f.clone());
        }
    } else {
        for f in &config.features {
            let display_name = f.display_name.clone().unwrap_or_else(|| f.key.clone());
            let required = tier(&format!("policy.features[{}]", f.key), &f.required_tier)?;
            builder = builder.gate(GatedFeature::new(f.key.as_str(), display_name, required));
        }
    }

    if config.limited.is_empty() {
        for f in builtin.limited_features() {
            builder = builder.limited(f.clone());
        }
    } else {
        for f in &config.limited {
            let mut feature = LimitedFeature::new(f.key.as_str(), f.allowed_on_free, f.allowed_on_paid);
            for (name, limit) in &f.limits {
                feature = feature.limit(tier(&format!("policy.limited[{}]", f.key), name)?, *limit);
            }
            builder = builder.limited(feature);
        }
    }

    builder.build()
}

/// Daily allowance table.
pub fn quota_policy(config: &PolicyConfig) -> Result<QuotaPolicy, EntitleError> {
    if config.metered.is_empty() {
        return Ok(QuotaPolicy::builtin());
    }
    QuotaPolicy::new(config.metered.iter().map(|m| {
        (
            m.kind.as_str(),
            DailyAllowance::new(m.daily.free, m.daily.pro, m.daily.premium),
        )
    }))
}

pub fn resolver(config: &EngineConfig) -> Result<PlanResolver, EntitleError> {
    Ok(PlanResolver::with_trial_default(tier(
        "engine.trial_default_tier",
        &config.trial_default_tier,
    )?))
}

/// All three pieces at once.
pub fn from_config(
    config: &Config,
) -> Result<(FeatureAccessPolicy, QuotaPolicy, PlanResolver), EntitleError> {
    Ok((
        feature_policy(&config.policy)?,
        quota_policy(&config.policy)?,
        resolver(&config.engine)?,
    ))
}
