//! Configuration file loading and error types.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: invalid json: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: invalid yaml: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{}: invalid toml: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{}: config file is empty", .0.display())]
    Empty(PathBuf),
    #[error("{}: unsupported config format (expected .toml, .yaml, .yml, .json or .jsonc)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("validation: {0}")]
    Validation(String),
}

/// Load a config file, picking the parser from the extension.
///
/// An empty TOML file yields the defaults. Empty JSON and YAML files are
/// rejected, since neither format has an empty document.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    if !matches!(ext, "json" | "jsonc" | "yaml" | "yml" | "toml") {
        return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
    }

    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if ext != "toml" && data.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }

    match ext {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            serde_json::from_reader(stripped).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        "yaml" | "yml" => serde_yaml::from_str(&data).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        _ => toml::from_str(&data).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
    }
}
