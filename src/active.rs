use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::folders::FolderResolver;
use crate::store::{BookmarkStore, KeyValueStore};

/// Persisted pointer to the profile currently mirrored into the bar.
pub struct ActiveProfileTracker<S, K> {
    folders: Arc<FolderResolver<S>>,
    kv: Arc<K>,
}

impl<S: BookmarkStore, K: KeyValueStore> ActiveProfileTracker<S, K> {
    pub fn new(folders: Arc<FolderResolver<S>>, kv: Arc<K>) -> Self {
        Self { folders, kv }
    }

    /// The persisted id if it still names a profile folder, otherwise the
    /// id of the Default profile. Stale or missing values are not errors.
    pub async fn get_active_profile_id(&self) -> Result<String> {
        let default = self.folders.resolve_or_create_default_folder().await?;
        let candidate = self.kv.get(&self.folders.layout().active_key)?;

        if let Some(candidate) = candidate {
            let profiles = self.folders.profile_folders().await?;
            if profiles.iter().any(|p| p.id == candidate) {
                return Ok(candidate);
            }
            debug!(
                "Active profile {} no longer exists, falling back to {}",
                candidate, default.id
            );
        }

        Ok(default.id)
    }

    /// Persist `id` as the active profile. Validated lazily on the next read.
    pub fn set_active_profile_id(&self, id: &str) -> Result<()> {
        self.kv.set(&self.folders.layout().active_key, id)?;
        debug!("Active profile set to {}", id);
        Ok(())
    }
}
