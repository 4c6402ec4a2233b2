use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::store::KeyValueStore;

/// On-disk layout of the state file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Key/value store persisted as a small JSON file, rewritten on every `set`.
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    state: Mutex<StateFile>,
}

impl JsonFileKeyValueStore {
    /// Load state from file; a missing file is an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse state file {:?}", path))?
        } else {
            StateFile::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, state: &StateFile) -> Result<()> {
        // Create parent directory if not exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;

        debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self
            .state
            .lock()
            .map_err(|_| anyhow!("state file lock poisoned"))?;
        Ok(state.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("state file lock poisoned"))?;
        state.values.insert(key.to_string(), value.to_string());
        self.save(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("active_profile").unwrap(), None);
        store.set("active_profile", "9").unwrap();

        let reopened = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("active_profile").unwrap().as_deref(), Some("9"));
    }

    #[test]
    fn test_corrupt_state_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(JsonFileKeyValueStore::open(&path).is_err());
    }
}
