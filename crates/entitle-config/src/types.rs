//! Configuration type definitions for the engine, quota store, policy tables and logging.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Tier names accepted wherever a config field names a plan tier.
pub const TIER_NAMES: [&str; 3] = ["free", "pro", "premium"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on a single quota store or subscription lookup round trip.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Tier for trials whose status does not name one.
    #[serde(default = "default_trial_tier")]
    pub trial_default_tier: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            trial_default_tier: default_trial_tier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Quota store backend: memory or sql.
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Database URL (required for the sql backend).
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            database_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Policy tables. An empty family falls back to the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub features: Vec<GatedFeatureConfig>,
    #[serde(default)]
    pub limited: Vec<LimitedFeatureConfig>,
    #[serde(default)]
    pub metered: Vec<MeteredFeatureConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatedFeatureConfig {
    pub key: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub required_tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitedFeatureConfig {
    pub key: String,
    #[serde(default)]
    pub allowed_on_free: bool,
    #[serde(default = "default_true")]
    pub allowed_on_paid: bool,
    /// Per-tier numeric limits, keyed by tier name. Missing tiers are unbounded.
    #[serde(default)]
    pub limits: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteredFeatureConfig {
    pub kind: String,
    pub daily: DailyAllowanceConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyAllowanceConfig {
    pub free: u32,
    pub pro: u32,
    pub premium: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"entitle_engine": "debug", "sqlx": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
