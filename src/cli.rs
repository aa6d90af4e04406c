//! `entitle check`: authorize a single request from the command line.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use entitle_config::{
    CliOverrides, Config, LoggingConfig, StoreConfig, apply_overrides, load_config,
    validate_config,
};
use entitle_engine::sql::{SqlQuotaConfig, SqlQuotaStore};
use entitle_engine::{
    AccessRequest, Decision, EntitleError, EntitlementEngine, MemoryQuotaStore,
    MeteredFeatureKind, QuotaStore, RawSubscriptionStatus,
};

use crate::policy;

/// Entitlement check CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "entitle-check",
    version,
    about = "Authorize one request and print the decision",
    group(ArgGroup::new("request").required(true).args(["feature", "limited", "metered", "peek"]))
)]
pub struct CheckArgs {
    /// Config file path (json/jsonc/yaml/toml). Built-in tables when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// User ID.
    #[arg(short, long)]
    pub user_id: String,

    /// Raw subscription status (free, pro, premium, lifetime, trial, trial:<tier>).
    #[arg(short, long, default_value = "free")]
    pub status: String,

    /// Gated feature key.
    #[arg(long)]
    pub feature: Option<String>,

    /// Limited feature key.
    #[arg(long)]
    pub limited: Option<String>,

    /// Metered kind to consume one slot of.
    #[arg(long)]
    pub metered: Option<String>,

    /// Metered kind to inspect without consuming.
    #[arg(long)]
    pub peek: Option<String>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

impl CheckArgs {
    fn request(&self) -> Option<AccessRequest> {
        if let Some(key) = &self.feature {
            Some(AccessRequest::feature(key.as_str()))
        } else if let Some(key) = &self.limited {
            Some(AccessRequest::limited(key.as_str()))
        } else {
            self.metered
                .as_deref()
                .map(AccessRequest::metered)
        }
    }
}

/// Run the check command.
pub async fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;

    init_tracing(&config.logging);
    debug!(
        project = entitle_core::PROJECT_NAME,
        version = entitle_core::VERSION,
        backend = %config.store.backend,
        "check starting"
    );

    let store = connect_store(&config.store).await?;
    let (features, quotas, resolver) = policy::from_config(&config)?;
    let engine = EntitlementEngine::new(features, quotas, store)
        .with_resolver(resolver)
        .with_store_timeout(Duration::from_millis(config.engine.store_timeout_ms));

    let status = RawSubscriptionStatus::parse(&args.status);
    let decision = evaluate(&engine, &args, &status).await?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

async fn evaluate<S: QuotaStore>(
    engine: &EntitlementEngine<S>,
    args: &CheckArgs,
    status: &RawSubscriptionStatus,
) -> Result<Decision, EntitleError> {
    if let Some(kind) = &args.peek {
        let tier = engine.resolver().resolve_or_free(status);
        return engine
            .peek_quota(&args.user_id, tier, &MeteredFeatureKind::from(kind.as_str()))
            .await;
    }
    match args.request() {
        Some(request) => engine.authorize_status(&args.user_id, status, &request).await,
        None => Err(EntitleError::InvalidPolicy("no request given".into())),
    }
}

async fn connect_store(
    config: &StoreConfig,
) -> Result<Box<dyn QuotaStore>, Box<dyn std::error::Error>> {
    if config.backend != "sql" {
        return Ok(Box::new(MemoryQuotaStore::new()));
    }

    let url = config.database_url.clone().unwrap_or_default();
    let sql = SqlQuotaConfig::new(url)
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    let store = SqlQuotaStore::connect(sql).await?;
    store.init_schema().await?;
    info!(database_type = ?store.database_type(), "using sql quota store");
    Ok(Box::new(store))
}

/// Initialize tracing subscriber with the given logging configuration.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `output`: Output target (stdout, stderr). Default: stderr
/// - `filters`: Per-module log level overrides
pub fn init_tracing(config: &LoggingConfig) {
    let base_level = config
        .level
        .as_deref()
        .unwrap_or(entitle_core::DEFAULT_LOG_LEVEL);
    let mut filter_str = base_level.to_string();

    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str)
        .unwrap_or_else(|_| EnvFilter::new(entitle_core::DEFAULT_LOG_LEVEL));

    let format = config
        .format
        .as_deref()
        .unwrap_or(entitle_core::DEFAULT_LOG_FORMAT);
    let output = config
        .output
        .as_deref()
        .unwrap_or(entitle_core::DEFAULT_LOG_OUTPUT);

    // Decision JSON goes to stdout, so logs default to stderr.
    match (format, output) {
        ("json", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stdout))
                .init();
        }
        ("json", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        ("compact", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stdout))
                .init();
        }
        ("compact", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        (_, "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use entitle_engine::{DecisionReason, PlanTier};

    use super::*;

    fn parse(args: &[&str]) -> CheckArgs {
        let mut argv = vec!["entitle-check"];
        argv.extend_from_slice(args);
        CheckArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn request_is_required() {
        assert!(CheckArgs::try_parse_from(["entitle-check", "-u", "alice"]).is_err());
        assert!(
            CheckArgs::try_parse_from([
                "entitle-check",
                "-u",
                "alice",
                "--feature",
                "a",
                "--metered",
                "b"
            ])
            .is_err()
        );
    }

    #[tokio::test]
    async fn evaluate_requests() {
        let engine = EntitlementEngine::builtin(MemoryQuotaStore::new());

        let args = parse(&["-u", "alice", "-s", "trial", "--feature", "advanced_analytics"]);
        let status = RawSubscriptionStatus::parse(&args.status);
        let d = evaluate(&engine, &args, &status).await.unwrap();
        assert_eq!(d, Decision::plan_insufficient(Some(PlanTier::Premium)));

        let args = parse(&["-u", "alice", "-s", "pro", "--metered", "pdf_report"]);
        let status = RawSubscriptionStatus::parse(&args.status);
        let d = evaluate(&engine, &args, &status).await.unwrap();
        assert_eq!(d, Decision::within_quota(1, 10));

        let args = parse(&["-u", "alice", "-s", "pro", "--peek", "pdf_report"]);
        let d = evaluate(&engine, &args, &status).await.unwrap();
        assert_eq!(d.reason, DecisionReason::Granted);
        assert_eq!(d.remaining, Some(9));
    }

    #[tokio::test]
    async fn memory_backend_by_default() {
        let store = connect_store(&StoreConfig::default()).await.unwrap();
        let used = store
            .current_usage("alice", &"pdf_report".into(), time::macros::date!(2026-05-01))
            .await
            .unwrap();
        assert_eq!(used, 0);
    }
}
