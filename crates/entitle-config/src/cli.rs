//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override quota store timeout (milliseconds)
    #[arg(long)]
    pub store_timeout_ms: Option<u64>,
    /// Override the tier untargeted trials resolve to (free/pro/premium)
    #[arg(long)]
    pub trial_default_tier: Option<String>,
    /// Override quota store backend (memory/sql)
    #[arg(long)]
    pub store_backend: Option<String>,
    /// Override database URL for the sql backend
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (pretty/compact/json)
    #[arg(long)]
    pub log_format: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = overrides.store_timeout_ms {
        config.engine.store_timeout_ms = v;
    }
    if let Some(v) = &overrides.trial_default_tier {
        config.engine.trial_default_tier = v.clone();
    }
    if let Some(v) = &overrides.store_backend {
        config.store.backend = v.clone();
    }
    if let Some(v) = &overrides.database_url {
        config.store.database_url = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
    if let Some(v) = &overrides.log_format {
        config.logging.format = Some(v.clone());
    }
}
