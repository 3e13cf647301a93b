use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while building or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize the merged configuration sources.
    #[error("failed to parse configuration: {source}")]
    Parse {
        #[source]
        source: ConfigLoaderError,
    },
    /// A recognized field failed validation.
    #[error("configuration value `{field}` is invalid: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

/// Errors raised by the installation-identity store.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("could not determine a home directory for the identity store")]
    NoHome,
    #[error("failed to access identity store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("identity store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode identity store {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
    #[error("identity store {path} holds an empty installation id")]
    EmptyId { path: PathBuf },
}

/// Errors from loading or evaluating a recorded test suite.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("failed to read suite directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read case file {path}: {source}")]
    ReadCase {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("case file {path} is not valid TOML: {source}")]
    ParseCase {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("workload container `{name}` is not available: {message}")]
    WorkloadUnavailable { name: String, message: String },
}

/// Failures surfaced by the command dispatch layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The invocation named a subcommand or flag this binary does not know.
    #[error("{message}")]
    Unrecognized { message: String },
    /// A recognized command ran and failed.
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}
