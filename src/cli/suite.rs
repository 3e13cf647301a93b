//! Recorded test-case loading and offline verification.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::debug;

use super::report::TestOutcome;
use crate::support::errors::SuiteError;

/// Response snapshot captured for a case: what the workload answered while
/// recording (`expected`) or during the latest replay (`observed`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

/// One recorded test case, stored as a TOML file by the recorder agent.
#[derive(Debug, Deserialize)]
pub struct CaseFile {
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
    pub expected: ResponseSnapshot,
    /// Missing until a replay ran; a case without it cannot pass.
    pub observed: Option<ResponseSnapshot>,
}

impl CaseFile {
    /// A case passes when the observed snapshot matches the expectation.
    pub fn evaluate(&self) -> TestOutcome {
        let passed = match &self.observed {
            Some(observed) => *observed == self.expected,
            None => false,
        };
        TestOutcome {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            passed,
        }
    }
}

/// Load every `*.toml` case under `dir`, ordered by file name so reports are
/// stable across runs.
pub async fn load_cases(dir: &Path) -> Result<Vec<CaseFile>, SuiteError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(|source| SuiteError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| SuiteError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut cases = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|source| SuiteError::ReadCase {
                path: path.clone(),
                source,
            })?;
        let case: CaseFile = toml::from_str(&raw).map_err(|source| SuiteError::ParseCase {
            path: path.clone(),
            source,
        })?;
        debug!(
            target: "rewind::suite",
            case = %case.name,
            path = %path.display(),
            "loaded case file"
        );
        cases.push(case);
    }
    Ok(cases)
}

/// Check that the workload container the cases were recorded against exists
/// before evaluating them.
pub async fn probe_workload(container_name: &str) -> Result<(), SuiteError> {
    let inspect = Command::new("docker")
        .arg("inspect")
        .arg(container_name)
        .output()
        .await
        .map_err(|err| SuiteError::WorkloadUnavailable {
            name: container_name.to_string(),
            message: err.to_string(),
        })?;
    if !inspect.status.success() {
        let stderr = String::from_utf8_lossy(&inspect.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("docker inspect exited with {}", inspect.status)
        } else {
            stderr
        };
        return Err(SuiteError::WorkloadUnavailable {
            name: container_name.to_string(),
            message,
        });
    }
    debug!(
        target: "rewind::suite",
        container = container_name,
        "workload container is present"
    );
    Ok(())
}
