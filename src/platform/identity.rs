//! Installation-identity persistence.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::support::errors::IdentityError;

const HOME_ENV_KEY: &str = "REWIND_HOME";
const STORE_DIR: &str = ".rewind";
const STORE_FILE: &str = "installation.toml";

/// File-backed store for the per-installation identifier.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    installation_id: String,
}

impl IdentityStore {
    /// Resolve the store root: `$REWIND_HOME` if set, else `$HOME/.rewind`.
    pub fn from_env() -> Result<Self, IdentityError> {
        if let Some(root) = env::var_os(HOME_ENV_KEY).filter(|value| !value.is_empty()) {
            return Ok(Self {
                root: PathBuf::from(root),
            });
        }
        let home = env::var_os("HOME")
            .filter(|value| !value.is_empty())
            .ok_or(IdentityError::NoHome)?;
        Ok(Self {
            root: PathBuf::from(home).join(STORE_DIR),
        })
    }

    /// Store rooted at an explicit directory.
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the persisted installation id, creating one on first use.
    pub fn installation_id(&self) -> Result<String, IdentityError> {
        let path = self.root.join(STORE_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let stored: StoredIdentity =
                    toml::from_str(&raw).map_err(|source| IdentityError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                if stored.installation_id.trim().is_empty() {
                    return Err(IdentityError::EmptyId { path });
                }
                debug!(
                    target: "rewind::identity",
                    path = %path.display(),
                    "loaded installation identity"
                );
                Ok(stored.installation_id)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => self.create(&path),
            Err(source) => Err(IdentityError::Io { path, source }),
        }
    }

    fn create(&self, path: &Path) -> Result<String, IdentityError> {
        fs::create_dir_all(&self.root).map_err(|source| IdentityError::Io {
            path: self.root.clone(),
            source,
        })?;
        let stored = StoredIdentity {
            installation_id: Uuid::new_v4().to_string(),
        };
        let raw = toml::to_string(&stored).map_err(|source| IdentityError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, raw).map_err(|source| IdentityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            target: "rewind::identity",
            path = %path.display(),
            "created new installation identity"
        );
        Ok(stored.installation_id)
    }
}
