//! Locating and lazily creating the profile root and the Default profile.
//!
//! Creation runs under a single guard and re-checks before creating, so
//! concurrent first-time callers sharing one resolver end up with exactly
//! one root and one Default folder.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::bookmarks::{
    BookmarkNode, SearchFilter, BOOKMARKS_BAR_ID, OTHER_BOOKMARKS_ID, SYNCED_BOOKMARKS_ID,
};
use crate::config::ProfileLayout;
use crate::error::{ProfileError, Result};
use crate::store::BookmarkStore;

pub struct FolderResolver<S> {
    store: Arc<S>,
    layout: ProfileLayout,
    create_guard: Mutex<()>,
}

impl<S: BookmarkStore> FolderResolver<S> {
    pub fn new(store: Arc<S>, layout: ProfileLayout) -> Self {
        Self {
            store,
            layout,
            create_guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &ProfileLayout {
        &self.layout
    }

    /// Find the unique folder carrying the profile-root title.
    ///
    /// Fails with [`ProfileError::ProfileRootNotFound`] when there is none,
    /// and also when the title is ambiguous.
    pub async fn resolve_profile_root(&self) -> Result<BookmarkNode> {
        let mut candidates = self.root_candidates().await?;
        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }
        if candidates.len() > 1 {
            debug!(
                "Found {} folders titled '{}'",
                candidates.len(),
                self.layout.root_title
            );
        }
        Err(ProfileError::ProfileRootNotFound(
            self.layout.root_title.clone(),
        ))
    }

    pub async fn resolve_or_create_profile_root(&self) -> Result<BookmarkNode> {
        match self.resolve_profile_root().await {
            Ok(root) => return Ok(root),
            Err(ProfileError::ProfileRootNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let _guard = self.create_guard.lock().await;

        // Another caller may have created it while we waited.
        let candidates = self.root_candidates().await?;
        if let Some(first) = candidates.first() {
            if candidates.len() > 1 {
                warn!(
                    "⚠️  {} folders titled '{}', using {}",
                    candidates.len(),
                    self.layout.root_title,
                    first.id
                );
            }
            return Ok(first.clone());
        }

        let root = self.store.create(None, &self.layout.root_title).await?;
        info!("📁 Created profile folder '{}' ({})", root.title, root.id);
        Ok(root)
    }

    /// Find the Default profile under the profile root, creating both as
    /// needed. With several folders titled Default the first listed wins.
    pub async fn resolve_or_create_default_folder(&self) -> Result<BookmarkNode> {
        let root = self.resolve_or_create_profile_root().await?;
        if let Some(folder) = self.find_default(&root.id).await? {
            return Ok(folder);
        }

        let _guard = self.create_guard.lock().await;
        if let Some(folder) = self.find_default(&root.id).await? {
            return Ok(folder);
        }

        let folder = self
            .store
            .create(Some(root.id.as_str()), &self.layout.default_title)
            .await?;
        info!("📁 Created default profile '{}' ({})", folder.title, folder.id);
        Ok(folder)
    }

    /// Direct children of the profile root, creating the root if needed.
    pub async fn profile_folders(&self) -> Result<Vec<BookmarkNode>> {
        let root = self.resolve_or_create_profile_root().await?;
        Ok(self.store.get_children(&root.id).await?)
    }

    /// Folders titled like the profile root sitting directly under a
    /// permanent root other than the bar. Anything on the bar is swapped out
    /// by every switch and cannot hold the profiles.
    async fn root_candidates(&self) -> Result<Vec<BookmarkNode>> {
        let results = self
            .store
            .search(&SearchFilter::title(self.layout.root_title.as_str()))
            .await?;
        Ok(results
            .into_iter()
            .filter(|node| node.title == self.layout.root_title && node.is_folder())
            .filter(|node| is_top_level(node, &self.layout.bar_id))
            .collect())
    }

    async fn find_default(&self, root_id: &str) -> Result<Option<BookmarkNode>> {
        let children = self.store.get_children(root_id).await?;
        Ok(children
            .into_iter()
            .find(|node| node.title == self.layout.default_title))
    }
}

fn is_top_level(node: &BookmarkNode, bar_id: &str) -> bool {
    let permanent = [BOOKMARKS_BAR_ID, OTHER_BOOKMARKS_ID, SYNCED_BOOKMARKS_ID];
    match node.parent_id.as_deref() {
        Some(parent) => parent != bar_id && permanent.contains(&parent),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkTree;
    use crate::store::MemoryBookmarkStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose reads fail while counting attempted creates.
    struct UnreadableStore {
        creates: AtomicUsize,
        failing_search: bool,
        failing_children: bool,
    }

    impl UnreadableStore {
        fn new(failing_search: bool, failing_children: bool) -> Self {
            Self {
                creates: AtomicUsize::new(0),
                failing_search,
                failing_children,
            }
        }
    }

    #[async_trait]
    impl BookmarkStore for UnreadableStore {
        async fn search(&self, _filter: &SearchFilter) -> anyhow::Result<Vec<BookmarkNode>> {
            if self.failing_search {
                anyhow::bail!("search unavailable");
            }
            Ok(vec![BookmarkNode {
                parent_id: Some(OTHER_BOOKMARKS_ID.to_string()),
                ..BookmarkNode::folder("5", "Switcher-Profiles")
            }])
        }

        async fn get_children(&self, _folder_id: &str) -> anyhow::Result<Vec<BookmarkNode>> {
            if self.failing_children {
                anyhow::bail!("children unavailable");
            }
            Ok(Vec::new())
        }

        async fn create(&self, _parent_id: Option<&str>, title: &str) -> anyhow::Result<BookmarkNode> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(BookmarkNode::folder("99", title))
        }

        async fn move_node(&self, _node_id: &str, _new_parent_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn resolver() -> (Arc<MemoryBookmarkStore>, FolderResolver<MemoryBookmarkStore>) {
        let store = Arc::new(MemoryBookmarkStore::new(BookmarkTree::new()));
        let resolver = FolderResolver::new(store.clone(), ProfileLayout::default());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_resolve_missing_root_is_not_found() {
        let (_, resolver) = resolver();
        let err = resolver.resolve_profile_root().await.unwrap_err();
        assert!(matches!(err, ProfileError::ProfileRootNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_or_create_creates_once() {
        let (store, resolver) = resolver();
        let first = resolver.resolve_or_create_profile_root().await.unwrap();
        let second = resolver.resolve_or_create_profile_root().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.parent_id.as_deref(), Some(OTHER_BOOKMARKS_ID));

        let roots = store.search(&SearchFilter::title("Switcher-Profiles")).await.unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_root_is_reused_not_duplicated() {
        let (store, resolver) = resolver();
        let a = store.create(None, "Switcher-Profiles").await.unwrap();
        store.create(None, "Switcher-Profiles").await.unwrap();

        assert!(resolver.resolve_profile_root().await.is_err());
        let root = resolver.resolve_or_create_profile_root().await.unwrap();
        assert_eq!(root.id, a.id);
        let roots = store.search(&SearchFilter::title("Switcher-Profiles")).await.unwrap();
        assert_eq!(roots.len(), 2);
    }

    #[tokio::test]
    async fn test_default_folder_created_under_root() {
        let (_, resolver) = resolver();
        let default = resolver.resolve_or_create_default_folder().await.unwrap();
        let root = resolver.resolve_profile_root().await.unwrap();
        assert_eq!(default.title, "Default");
        assert_eq!(default.parent_id.as_deref(), Some(root.id.as_str()));

        let again = resolver.resolve_or_create_default_folder().await.unwrap();
        assert_eq!(again.id, default.id);
    }

    #[tokio::test]
    async fn test_first_default_wins_when_duplicated() {
        let (store, resolver) = resolver();
        let root = resolver.resolve_or_create_profile_root().await.unwrap();
        let first = store.create(Some(root.id.as_str()), "Default").await.unwrap();
        store.create(Some(root.id.as_str()), "Default").await.unwrap();

        let default = resolver.resolve_or_create_default_folder().await.unwrap();
        assert_eq!(default.id, first.id);
    }

    #[tokio::test]
    async fn test_concurrent_initialisation_creates_single_folders() {
        let (store, resolver) = resolver();
        let resolver = Arc::new(resolver);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve_or_create_default_folder().await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let roots = store.search(&SearchFilter::title("Switcher-Profiles")).await.unwrap();
        assert_eq!(roots.len(), 1);
        let defaults = store.search(&SearchFilter::title("Default")).await.unwrap();
        assert_eq!(defaults.len(), 1);
    }

    #[tokio::test]
    async fn test_nested_folder_with_root_title_is_ignored() {
        let (store, resolver) = resolver();
        let on_bar = store.create(Some(BOOKMARKS_BAR_ID), "Switcher-Profiles").await.unwrap();
        let holder = store.create(None, "Archive").await.unwrap();
        let deep = store.create(Some(holder.id.as_str()), "Switcher-Profiles").await.unwrap();

        assert!(matches!(
            resolver.resolve_profile_root().await,
            Err(ProfileError::ProfileRootNotFound(_))
        ));

        let root = resolver.resolve_or_create_profile_root().await.unwrap();
        assert_ne!(root.id, on_bar.id);
        assert_ne!(root.id, deep.id);
        assert_eq!(root.parent_id.as_deref(), Some(OTHER_BOOKMARKS_ID));
        assert_eq!(resolver.resolve_profile_root().await.unwrap().id, root.id);
    }

    #[tokio::test]
    async fn test_root_under_mobile_bookmarks_is_found() {
        let (store, resolver) = resolver();
        let mobile = store.create(Some(SYNCED_BOOKMARKS_ID), "Switcher-Profiles").await.unwrap();
        assert_eq!(resolver.resolve_profile_root().await.unwrap().id, mobile.id);
    }

    #[tokio::test]
    async fn test_search_failure_propagates_without_creating() {
        let store = Arc::new(UnreadableStore::new(true, false));
        let resolver = FolderResolver::new(store.clone(), ProfileLayout::default());

        let err = resolver.resolve_or_create_profile_root().await.unwrap_err();
        assert!(matches!(err, ProfileError::Store(_)));
        assert!(err.to_string().contains("search unavailable"));

        assert!(matches!(
            resolver.resolve_or_create_default_folder().await,
            Err(ProfileError::Store(_))
        ));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_children_failure_propagates_without_creating() {
        let store = Arc::new(UnreadableStore::new(false, true));
        let resolver = FolderResolver::new(store.clone(), ProfileLayout::default());

        assert_eq!(resolver.resolve_profile_root().await.unwrap().id, "5");
        assert!(matches!(
            resolver.profile_folders().await,
            Err(ProfileError::Store(_))
        ));
        assert!(matches!(
            resolver.resolve_or_create_default_folder().await,
            Err(ProfileError::Store(_))
        ));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }
}
