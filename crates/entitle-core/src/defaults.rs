//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Engine Defaults
// ============================================================================

/// Default bound on a single quota store round trip, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
/// Largest accepted store timeout, in milliseconds.
pub const MAX_STORE_TIMEOUT_MS: u64 = 30_000;
/// Tier a trial resolves to when the subscription does not name one.
pub const DEFAULT_TRIAL_TIER: &str = "pro";

// ============================================================================
// Store Defaults
// ============================================================================

/// Default quota store backend.
pub const DEFAULT_STORE_BACKEND: &str = "memory";
/// Default maximum SQL pool connections.
pub const DEFAULT_SQL_MAX_CONNECTIONS: u32 = 10;
/// Default minimum SQL pool connections.
pub const DEFAULT_SQL_MIN_CONNECTIONS: u32 = 1;
/// Default SQL connect (pool acquire) timeout in seconds.
pub const DEFAULT_SQL_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Default SQL connection max lifetime in seconds.
pub const DEFAULT_SQL_MAX_LIFETIME_SECS: u64 = 1800;
/// Default SQL idle connection timeout in seconds.
pub const DEFAULT_SQL_IDLE_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default log format (pretty, compact, json).
pub const DEFAULT_LOG_FORMAT: &str = "pretty";
/// Default log output (stdout, stderr).
pub const DEFAULT_LOG_OUTPUT: &str = "stderr";
