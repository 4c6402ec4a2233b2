use std::sync::Arc;
use tracing::{debug, info};

use crate::bookmarks::BookmarkNode;
use crate::error::{ProfileError, Result};
use crate::folders::FolderResolver;
use crate::store::BookmarkStore;

/// Profiles are the direct children of the profile root.
pub struct ProfileRegistry<S> {
    folders: Arc<FolderResolver<S>>,
}

impl<S: BookmarkStore> ProfileRegistry<S> {
    pub fn new(folders: Arc<FolderResolver<S>>) -> Self {
        Self { folders }
    }

    /// List every profile in folder order. Creates the profile root on
    /// first use, so a fresh tree yields an empty list.
    pub async fn list_profiles(&self) -> Result<Vec<BookmarkNode>> {
        let profiles = self.folders.profile_folders().await?;
        debug!("Found {} profiles", profiles.len());
        Ok(profiles)
    }

    /// Create a new profile folder. Duplicate names are allowed.
    pub async fn create_profile(&self, name: Option<&str>) -> Result<BookmarkNode> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            other => return Err(ProfileError::InvalidProfileName(other.map(str::to_string))),
        };

        let root = self.folders.resolve_or_create_profile_root().await?;
        let profile = self.folders.store().create(Some(root.id.as_str()), name).await?;
        info!("➕ Created profile '{}' ({})", profile.title, profile.id);
        Ok(profile)
    }

    /// First profile whose id, or failing that whose title, equals `needle`.
    pub async fn find_profile(&self, needle: &str) -> Result<Option<BookmarkNode>> {
        let profiles = self.list_profiles().await?;
        if let Some(profile) = profiles.iter().find(|p| p.id == needle) {
            return Ok(Some(profile.clone()));
        }
        Ok(profiles.into_iter().find(|p| p.title == needle))
    }
}
