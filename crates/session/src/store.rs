//! Persistent key-value storage for the credential pair

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::StoreError;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access and refresh token, as issued by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Key-value storage holding the tokens between requests (and, for
/// persistent backends, between runs).
///
/// Reads are infallible: a backend that cannot read a value reports it as
/// absent, which the session manager treats as an anonymous session.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential pair
    pub fn with_credentials(credentials: &CredentialPair) -> Self {
        let store = Self::new();
        {
            let mut values = store.values.write().unwrap_or_else(PoisonError::into_inner);
            values.insert(ACCESS_TOKEN_KEY.to_string(), credentials.access_token.clone());
            values.insert(REFRESH_TOKEN_KEY.to_string(), credentials.refresh_token.clone());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// JSON file store. Every mutation is written through to disk, so the
/// session survives a restart of the process.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading existing values if the file exists.
    ///
    /// A file that does not hold valid JSON is treated as an empty session;
    /// it is replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw).unwrap_or_else(|err| {
                    log::warn!(
                        "Ignoring unreadable token store {}: {}",
                        path.display(),
                        err
                    );
                    HashMap::new()
                })
            }
        } else {
            HashMap::new()
        };

        log::debug!("Opened token store at {}", path.display());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        // Write a sibling file and rename it over the store, so a crash
        // mid-write never leaves a truncated session behind
        let staging = self.staging_path();
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}
