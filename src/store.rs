use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

use crate::bookmarks::{BookmarkNode, BookmarkTree, SearchFilter};

/// Capability set the profile engine needs from a bookmark backend.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<BookmarkNode>>;
    async fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkNode>>;
    async fn create(&self, parent_id: Option<&str>, title: &str) -> Result<BookmarkNode>;
    async fn move_node(&self, node_id: &str, new_parent_id: &str) -> Result<()>;
}

/// Durable string key/value cell used for the active profile pointer.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Bookmark store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBookmarkStore {
    tree: Mutex<BookmarkTree>,
}

impl MemoryBookmarkStore {
    pub fn new(tree: BookmarkTree) -> Self {
        Self {
            tree: Mutex::new(tree),
        }
    }

    pub async fn snapshot(&self) -> BookmarkTree {
        self.tree.lock().await.clone()
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<BookmarkNode>> {
        Ok(self.tree.lock().await.search(filter))
    }

    async fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        self.tree.lock().await.children(folder_id)
    }

    async fn create(&self, parent_id: Option<&str>, title: &str) -> Result<BookmarkNode> {
        self.tree.lock().await.create(parent_id, title)
    }

    async fn move_node(&self, node_id: &str, new_parent_id: &str) -> Result<()> {
        self.tree.lock().await.move_node(node_id, new_parent_id)
    }
}

/// In-memory key/value store that counts writes.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: StdMutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("key/value store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("key/value store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl<S: BookmarkStore + ?Sized> BookmarkStore for std::sync::Arc<S> {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<BookmarkNode>> {
        (**self).search(filter).await
    }

    async fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        (**self).get_children(folder_id).await
    }

    async fn create(&self, parent_id: Option<&str>, title: &str) -> Result<BookmarkNode> {
        (**self).create(parent_id, title).await
    }

    async fn move_node(&self, node_id: &str, new_parent_id: &str) -> Result<()> {
        (**self).move_node(node_id, new_parent_id).await
    }
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
