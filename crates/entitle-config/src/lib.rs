//! Configuration loading and CLI definitions.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const TOML_CONFIG: &str = r#"
[engine]
store_timeout_ms = 500
trial_default_tier = "premium"

[store]
backend = "sql"
database_url = "sqlite:usage.db"

[[policy.features]]
key = "ai_summaries"
display_name = "AI summaries"
required_tier = "pro"

[[policy.limited]]
key = "vocabulary_review"
allowed_on_free = true
limits = { free = 5, pro = 10 }

[[policy.metered]]
kind = "content_generation"
daily = { free = 3, pro = 12, premium = 50 }

[logging]
level = "debug"
format = "json"
filters = { entitle_engine = "trace" }
"#;

    #[test]
    fn load_toml() {
        let file = write_temp(".toml", TOML_CONFIG);
        let cfg = load_config(file.path()).unwrap();
        validate_config(&cfg).unwrap();

        assert_eq!(cfg.engine.store_timeout_ms, 500);
        assert_eq!(cfg.engine.trial_default_tier, "premium");
        assert_eq!(cfg.store.backend, "sql");
        assert_eq!(cfg.store.max_connections, 10);
        assert_eq!(cfg.policy.features.len(), 1);
        assert!(cfg.policy.limited[0].allowed_on_paid);
        assert_eq!(cfg.policy.limited[0].limits.get("pro"), Some(&10));
        assert_eq!(cfg.policy.metered[0].daily.pro, 12);
        assert_eq!(
            cfg.logging.filters.get("entitle_engine").map(String::as_str),
            Some("trace")
        );
    }

    #[test]
    fn load_jsonc_with_comments() {
        let json = r#"{
            // Shorter timeout for the edge
            "engine": { "store_timeout_ms": 750 },
            /* sql store */
            "store": { "backend": "memory" }
        }"#;
        let file = write_temp(".jsonc", json);
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.engine.store_timeout_ms, 750);
        assert_eq!(cfg.engine.trial_default_tier, "pro");
        assert!(cfg.policy.features.is_empty());
    }

    #[test]
    fn load_yaml() {
        let yaml = r#"
engine:
  trial_default_tier: free
policy:
  metered:
    - kind: pdf_report
      daily: { free: 1, pro: 10, premium: 30 }
"#;
        let file = write_temp(".yaml", yaml);
        let cfg = load_config(file.path()).unwrap();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.engine.trial_default_tier, "free");
        assert_eq!(cfg.policy.metered[0].kind, "pdf_report");
    }

    #[test]
    fn empty_toml_is_valid() {
        let file = write_temp(".toml", "");
        let cfg = load_config(file.path()).unwrap();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.store.backend, "memory");
    }

    #[test]
    fn unsupported_extension() {
        let file = write_temp(".ini", "x=1");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_errors_name_the_file() {
        let missing = std::env::temp_dir().join("entitle-missing-config.toml");
        let err = load_config(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("entitle-missing-config.toml"));

        let file = write_temp(".json", "{ \"engine\": { \"store_timeout_ms\": \"fast\" } }");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));

        let file = write_temp(".toml", "[engine\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn empty_json_and_yaml_are_rejected() {
        for suffix in [".json", ".jsonc", ".yaml"] {
            let file = write_temp(suffix, "  \n");
            match load_config(file.path()) {
                Err(ConfigError::Empty(path)) => assert_eq!(path, file.path()),
                other => panic!("expected empty file error for {suffix}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tier_names_are_case_insensitive() {
        let toml = r#"
[engine]
trial_default_tier = "Premium"

[[policy.features]]
key = "ai_summaries"
required_tier = "Pro"

[[policy.limited]]
key = "vocabulary_review"
limits = { FREE = 5 }
"#;
        let file = write_temp(".toml", toml);
        let cfg = load_config(file.path()).unwrap();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.policy.features[0].required_tier, "Pro");
    }

    fn invalid(mutate: impl FnOnce(&mut Config)) -> String {
        let mut cfg = Config::default();
        mutate(&mut cfg);
        match validate_config(&cfg) {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validation_errors() {
        assert!(invalid(|c| c.engine.store_timeout_ms = 0).contains("store_timeout_ms"));
        assert!(invalid(|c| c.engine.store_timeout_ms = 60_000).contains("store_timeout_ms"));
        assert!(invalid(|c| c.engine.trial_default_tier = "gold".into()).contains("gold"));
        assert!(invalid(|c| c.store.backend = "redis".into()).contains("store.backend"));
        assert!(invalid(|c| c.store.backend = "sql".into()).contains("database_url"));
        assert!(invalid(|c| c.store.max_connections = 0).contains("max_connections"));
        assert!(invalid(|c| c.store.min_connections = 20).contains("min_connections"));
        assert!(invalid(|c| c.store.connect_timeout_secs = 0).contains("connect_timeout_secs"));
        assert!(invalid(|c| c.logging.format = Some("xml".into())).contains("logging.format"));
        assert!(invalid(|c| c.logging.output = Some("file".into())).contains("logging.output"));
    }

    #[test]
    fn policy_validation_errors() {
        let gate = |key: &str, tier: &str| GatedFeatureConfig {
            key: key.into(),
            display_name: None,
            required_tier: tier.into(),
        };
        let limited = |key: &str| LimitedFeatureConfig {
            key: key.into(),
            allowed_on_free: true,
            allowed_on_paid: true,
            limits: Default::default(),
        };

        assert!(
            invalid(|c| c.policy.features = vec![gate("a", "pro"), gate("a", "free")])
                .contains("duplicate")
        );
        assert!(invalid(|c| c.policy.features = vec![gate("a", "gold")]).contains("gold"));
        assert!(
            invalid(|c| {
                c.policy.features = vec![gate("a", "pro")];
                c.policy.limited = vec![limited("a")];
            })
            .contains("both")
        );
        assert!(
            invalid(|c| {
                let mut l = limited("b");
                l.limits.insert("enterprise".into(), 3);
                c.policy.limited = vec![l];
            })
            .contains("enterprise")
        );
    }

    #[test]
    fn overrides_apply() {
        let mut cfg = Config::default();
        let overrides = CliOverrides {
            store_timeout_ms: Some(100),
            trial_default_tier: Some("premium".into()),
            store_backend: Some("sql".into()),
            database_url: Some("sqlite::memory:".into()),
            log_level: Some("warn".into()),
            log_format: Some("compact".into()),
        };
        apply_overrides(&mut cfg, &overrides);
        validate_config(&cfg).unwrap();

        assert_eq!(cfg.engine.store_timeout_ms, 100);
        assert_eq!(cfg.engine.trial_default_tier, "premium");
        assert_eq!(cfg.store.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(cfg.logging.level.as_deref(), Some("warn"));
        assert_eq!(cfg.logging.format.as_deref(), Some("compact"));
    }
}
