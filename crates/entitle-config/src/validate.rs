//! Configuration validation logic.

use std::collections::HashSet;

use crate::Config;
use crate::defaults::max_store_timeout_ms;
use crate::loader::ConfigError;
use crate::types::TIER_NAMES;

const STORE_BACKENDS: [&str; 2] = ["memory", "sql"];
const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];
const LOG_OUTPUTS: [&str; 2] = ["stdout", "stderr"];

fn check_tier(field: &str, tier: &str) -> Result<(), ConfigError> {
    if TIER_NAMES.contains(&tier.trim().to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{field} must be one of: {TIER_NAMES:?} (got '{tier}')"
        )))
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let timeout = config.engine.store_timeout_ms;
    if timeout == 0 || timeout > max_store_timeout_ms() {
        return Err(ConfigError::Validation(format!(
            "engine.store_timeout_ms must be 1..={}",
            max_store_timeout_ms()
        )));
    }
    check_tier("engine.trial_default_tier", &config.engine.trial_default_tier)?;

    let store = &config.store;
    if !STORE_BACKENDS.contains(&store.backend.as_str()) {
        return Err(ConfigError::Validation(format!(
            "store.backend must be one of: {STORE_BACKENDS:?}"
        )));
    }
    if store.backend == "sql" && store.database_url.as_deref().unwrap_or("").trim().is_empty() {
        return Err(ConfigError::Validation(
            "store.database_url is required for the sql backend".into(),
        ));
    }
    if store.max_connections == 0 {
        return Err(ConfigError::Validation(
            "store.max_connections must be > 0".into(),
        ));
    }
    if store.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "store.connect_timeout_secs must be > 0".into(),
        ));
    }
    if store.min_connections > store.max_connections {
        return Err(ConfigError::Validation(
            "store.min_connections cannot exceed store.max_connections".into(),
        ));
    }

    let policy = &config.policy;
    let mut gated = HashSet::new();
    for f in &policy.features {
        if f.key.trim().is_empty() {
            return Err(ConfigError::Validation("policy.features: empty key".into()));
        }
        if !gated.insert(f.key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "policy.features: duplicate key '{}'",
                f.key
            )));
        }
        check_tier(&format!("policy.features[{}].required_tier", f.key), &f.required_tier)?;
    }
    let mut limited = HashSet::new();
    for f in &policy.limited {
        if f.key.trim().is_empty() {
            return Err(ConfigError::Validation("policy.limited: empty key".into()));
        }
        if !limited.insert(f.key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "policy.limited: duplicate key '{}'",
                f.key
            )));
        }
        if gated.contains(f.key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "'{}' is listed in both policy.features and policy.limited",
                f.key
            )));
        }
        for tier in f.limits.keys() {
            check_tier(&format!("policy.limited[{}].limits", f.key), tier)?;
        }
    }
    let mut metered = HashSet::new();
    for m in &policy.metered {
        if m.kind.trim().is_empty() {
            return Err(ConfigError::Validation("policy.metered: empty kind".into()));
        }
        if !metered.insert(m.kind.as_str()) {
            return Err(ConfigError::Validation(format!(
                "policy.metered: duplicate kind '{}'",
                m.kind
            )));
        }
    }

    if let Some(format) = &config.logging.format
        && !LOG_FORMATS.contains(&format.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.format must be one of: {LOG_FORMATS:?}"
        )));
    }
    if let Some(output) = &config.logging.output
        && !LOG_OUTPUTS.contains(&output.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.output must be one of: {LOG_OUTPUTS:?}"
        )));
    }
    Ok(())
}
