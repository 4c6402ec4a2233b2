use serde::Serialize;
use std::sync::Arc;

use crate::active::ActiveProfileTracker;
use crate::bookmarks::BookmarkNode;
use crate::config::ProfileLayout;
use crate::error::Result;
use crate::folders::FolderResolver;
use crate::profiles::ProfileRegistry;
use crate::store::{BookmarkStore, KeyValueStore};
use crate::switcher::{ProfileSwitcher, SwitchReport};

/// Active profile id together with the profile list, as a UI would render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileOverview {
    pub active_profile_id: String,
    pub profiles: Vec<BookmarkNode>,
}

impl ProfileOverview {
    pub fn active_profile(&self) -> Option<&BookmarkNode> {
        self.profiles.iter().find(|p| p.id == self.active_profile_id)
    }
}

/// Entry point wiring the folder resolver, registry, tracker and switcher
/// over one bookmark store and one key/value store.
pub struct ProfileService<S, K> {
    folders: Arc<FolderResolver<S>>,
    registry: ProfileRegistry<S>,
    tracker: Arc<ActiveProfileTracker<S, K>>,
    switcher: ProfileSwitcher<S, K>,
}

impl<S: BookmarkStore, K: KeyValueStore> ProfileService<S, K> {
    pub fn new(store: Arc<S>, kv: Arc<K>, layout: ProfileLayout) -> Self {
        let folders = Arc::new(FolderResolver::new(store, layout));
        let tracker = Arc::new(ActiveProfileTracker::new(folders.clone(), kv));
        Self {
            registry: ProfileRegistry::new(folders.clone()),
            switcher: ProfileSwitcher::new(folders.clone(), tracker.clone()),
            tracker,
            folders,
        }
    }

    pub fn store(&self) -> &S {
        self.folders.store()
    }

    pub fn layout(&self) -> &ProfileLayout {
        self.folders.layout()
    }

    pub async fn list_profiles(&self) -> Result<Vec<BookmarkNode>> {
        self.registry.list_profiles().await
    }

    pub async fn create_profile(&self, name: Option<&str>) -> Result<BookmarkNode> {
        self.registry.create_profile(name).await
    }

    pub async fn find_profile(&self, needle: &str) -> Result<Option<BookmarkNode>> {
        self.registry.find_profile(needle).await
    }

    pub async fn get_active_profile_id(&self) -> Result<String> {
        self.tracker.get_active_profile_id().await
    }

    pub async fn switch_to(&self, id: &str) -> Result<SwitchReport> {
        self.switcher.switch_to(id).await
    }

    /// Active id first, then the list, so a fresh tree already shows Default.
    pub async fn overview(&self) -> Result<ProfileOverview> {
        let active_profile_id = self.get_active_profile_id().await?;
        let profiles = self.list_profiles().await?;
        Ok(ProfileOverview {
            active_profile_id,
            profiles,
        })
    }

    /// Current direct children of the bookmarks bar.
    pub async fn bar_contents(&self) -> Result<Vec<BookmarkNode>> {
        Ok(self.store().get_children(&self.layout().bar_id).await?)
    }
}
