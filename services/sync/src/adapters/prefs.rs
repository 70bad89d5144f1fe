//! services/sync/src/adapters/prefs.rs
//!
//! This module contains the file-backed preference store, the concrete
//! implementation of the `PreferenceStore` port, plus the helpers that keep
//! the organization's branding profile in it.

use async_trait::async_trait;
use madrasa_console_core::domain::OrgProfile;
use madrasa_console_core::ports::{PreferenceStore, PrefsError};
use std::collections::HashMap;
use std::path::PathBuf;

const ORG_PROFILE_KEY: &str = "org_profile";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A preference store persisting a flat string map as a JSON file.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Creates a new `FilePreferenceStore` at the given path. The file is
    /// created lazily on the first `set`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<HashMap<String, String>, PrefsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| PrefsError(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(PrefsError(e.to_string())),
        }
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        let raw =
            serde_json::to_string_pretty(&values).map_err(|e| PrefsError(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| PrefsError(e.to_string()))
    }
}

//=========================================================================================
// Branding Profile Helpers
//=========================================================================================

/// Loads the organization profile, falling back to the stock branding when
/// none has been saved yet.
pub async fn load_org_profile(store: &dyn PreferenceStore) -> Result<OrgProfile, PrefsError> {
    match store.get(ORG_PROFILE_KEY).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| PrefsError(e.to_string())),
        None => Ok(OrgProfile::default()),
    }
}

/// Persists the organization profile.
pub async fn save_org_profile(
    store: &dyn PreferenceStore,
    profile: &OrgProfile,
) -> Result<(), PrefsError> {
    let raw = serde_json::to_string(profile).map_err(|e| PrefsError(e.to_string()))?;
    store.set(ORG_PROFILE_KEY, &raw).await
}

//=========================================================================================
// Tests
//=========================================================================================
