//! Configuration state assembled during bootstrap.
//!
//! Layering order: compiled-in seeds, then the optional `rewind.toml`, then
//! `REWIND_*` environment overrides.

use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::support::errors::ConfigError;

/// Compiled-in API server the auth service talks to.
pub const API_SERVER_URL: &str = "http://localhost:8083";
/// Compiled-in GitHub OAuth app client id used for device login.
pub const GITHUB_CLIENT_ID: &str = "Iv23liAqT7fXbY92KpQd";

const CONFIG_ENV_KEY: &str = "REWIND_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "rewind.toml";
const ENV_PREFIX: &str = "REWIND";

/// Recognized configuration fields for one process run.
///
/// Mutable only while bootstrap seeds it; dispatch receives it read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_server_url: String,
    pub github_client_id: String,
    /// Stamped by bootstrap once identity resolution succeeds.
    pub installation_id: String,
    /// Working path recordings live under; empty when unconfigured.
    pub path: PathBuf,
    pub test: TestSettings,
}

/// Settings consumed by the `test` command.
#[derive(Debug, Clone, Default)]
pub struct TestSettings {
    /// Full command line of this invocation.
    pub cmd_used: String,
    pub container_name: Option<String>,
    pub compose_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    api_server_url: Option<String>,
    path: Option<PathBuf>,
    test: Option<RawTestSection>,
}

#[derive(Debug, Deserialize, Default)]
struct RawTestSection {
    container_name: Option<String>,
    compose_file: Option<PathBuf>,
}

impl Config {
    /// Build the configuration for this run. `cmd_used` records the full
    /// command line of the invocation.
    pub fn build(cmd_used: String) -> Result<Self, ConfigError> {
        let path = config_file_path();
        let builder = config::Config::builder()
            .add_source(config::File::from(path.clone()).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
        let document = builder.build().map_err(|source| ConfigError::FileRead {
            path: path.clone(),
            source,
        })?;
        let raw: RawConfig = document
            .try_deserialize()
            .map_err(|source| ConfigError::Parse { source })?;
        Self::from_raw(raw, cmd_used)
    }

    fn from_raw(raw: RawConfig, cmd_used: String) -> Result<Self, ConfigError> {
        let api_server_url = raw
            .api_server_url
            .unwrap_or_else(|| API_SERVER_URL.to_string());
        validate_endpoint(&api_server_url)?;

        let test_raw = raw.test.unwrap_or_default();
        let config = Self {
            api_server_url,
            github_client_id: GITHUB_CLIENT_ID.to_string(),
            installation_id: String::new(),
            path: raw.path.unwrap_or_default(),
            test: TestSettings {
                cmd_used,
                container_name: test_raw.container_name,
                compose_file: test_raw.compose_file,
            },
        };
        debug!(
            target: "rewind::config",
            api_server_url = %config.api_server_url,
            path = %config.path.display(),
            "configuration assembled"
        );
        Ok(config)
    }
}

fn config_file_path() -> PathBuf {
    match env::var(CONFIG_ENV_KEY) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn validate_endpoint(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        field: "api_server_url",
        message: "expected an http(s) URL".into(),
    })
}
