//! # entitle
//!
//! Plan-tier feature gating and daily quota authorization.
//!
//! ## Crates
//!
//! - [`entitle_core`] - Default constants and error labels
//! - [`entitle_engine`] - Policies, quota stores and the authorization engine
//! - [`entitle_config`] - Configuration loading and validation
//! - [`entitle_metrics`] - Metric names and recording helpers

pub mod cli;
pub mod policy;

pub use entitle_config as config;
pub use entitle_core as core;
pub use entitle_engine as engine;
pub use entitle_metrics as metrics;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use entitle_config::{Config, load_config, validate_config};
    pub use entitle_engine::{
        AccessRequest, Decision, DecisionReason, EntitleError, EntitlementEngine,
        MemoryQuotaStore, PlanTier, QuotaStore, RawSubscriptionStatus,
    };
}
