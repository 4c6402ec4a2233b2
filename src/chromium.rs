//! File-backed bookmark store speaking the Chromium `Bookmarks` JSON format.
//!
//! The whole file is parsed into a [`BookmarkTree`] on open. Fields the
//! tree does not model (`guid`, `date_added`, `meta_info`, ...) are kept
//! per node id and written back untouched, as are top-level keys other than
//! `roots` (`sync_metadata`, ...). The stale `checksum` is dropped.
//!
//! Every mutation is applied to a copy of the tree, written through a temp
//! file + rename, and only then becomes the store's state. The file found
//! on disk is copied to `Bookmarks.backup` unless a backup already exists.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bookmarks::{
    BookmarkNode, BookmarkTree, SearchFilter, BOOKMARKS_BAR_ID, OTHER_BOOKMARKS_ID,
    SYNCED_BOOKMARKS_ID,
};
use crate::store::BookmarkStore;

/// Seconds between 1601-01-01 (Chromium epoch) and 1970-01-01.
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

const ROOT_KEYS: [(&str, &str, &str); 3] = [
    ("bookmark_bar", BOOKMARKS_BAR_ID, "Bookmarks bar"),
    ("other", OTHER_BOOKMARKS_ID, "Other bookmarks"),
    ("synced", SYNCED_BOOKMARKS_ID, "Mobile bookmarks"),
];

/// Keys mapped onto [`BookmarkNode`] fields, everything else is carried through.
const MODELLED_KEYS: [&str; 5] = ["id", "name", "type", "url", "children"];

#[derive(Clone)]
struct ChromiumState {
    /// Top-level object of the file, `roots` is replaced on write
    document: Map<String, Value>,
    tree: BookmarkTree,
    extras: HashMap<String, Map<String, Value>>,
}

pub struct ChromiumBookmarkStore {
    path: PathBuf,
    state: Mutex<ChromiumState>,
}

impl ChromiumBookmarkStore {
    /// Open a `Bookmarks` file. A missing file starts as an empty tree with
    /// the three standard roots and is created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read bookmarks file {:?}", path))?;
            let json: Value = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse bookmarks file {:?}", path))?;
            parse_chromium_bookmarks(json)?
        } else {
            debug!("No bookmarks file at {:?}, starting empty", path);
            ChromiumState {
                document: Map::new(),
                tree: BookmarkTree::new(),
                extras: HashMap::new(),
            }
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> BookmarkTree {
        self.state.lock().await.tree.clone()
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("backup")
    }

    fn persist(&self, state: &ChromiumState) -> Result<()> {
        if self.path.exists() {
            let backup_path = self.backup_path();
            if !backup_path.exists() {
                fs::copy(&self.path, &backup_path)
                    .with_context(|| format!("Failed to back up {:?}", self.path))?;
                info!("💾 Backup created: {:?}", backup_path);
            }
        } else if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let json = bookmarks_to_chromium_json(state);
        let data = serde_json::to_string_pretty(&json)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        debug!("Wrote bookmarks to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for ChromiumBookmarkStore {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<BookmarkNode>> {
        Ok(self.state.lock().await.tree.search(filter))
    }

    async fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        self.state.lock().await.tree.children(folder_id)
    }

    async fn create(&self, parent_id: Option<&str>, title: &str) -> Result<BookmarkNode> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let node = next.tree.create(parent_id, title)?;

        let mut extra = Map::new();
        extra.insert("date_added".to_string(), json!(chromium_timestamp()));
        extra.insert("date_modified".to_string(), json!("0"));
        extra.insert("guid".to_string(), json!(uuid::Uuid::new_v4().to_string()));
        next.extras.insert(node.id.clone(), extra);

        self.persist(&next)?;
        *state = next;
        Ok(node)
    }

    async fn move_node(&self, node_id: &str, new_parent_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.tree.move_node(node_id, new_parent_id)?;

        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}

/// Current time as Chromium stores it: microseconds since 1601-01-01, as a string.
fn chromium_timestamp() -> String {
    let micros = Utc::now().timestamp_micros() + WINDOWS_EPOCH_OFFSET_SECS * 1_000_000;
    micros.to_string()
}

fn parse_chromium_bookmarks(json: Value) -> Result<ChromiumState> {
    let mut document = match json {
        Value::Object(document) => document,
        _ => return Err(anyhow!("Bookmarks file is not a JSON object")),
    };
    document.remove("checksum");
    let roots = document
        .get("roots")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow!("Bookmarks file has no 'roots' object"))?;

    let mut extras = HashMap::new();
    let mut nodes = Vec::new();
    for (key, id, name) in ROOT_KEYS {
        let node = match roots.get(key) {
            Some(root) => parse_chromium_node(root, &mut extras)?,
            None => BookmarkNode::folder(id, name),
        };
        nodes.push(node);
    }

    Ok(ChromiumState {
        tree: BookmarkTree::from_roots(nodes),
        extras,
        document,
    })
}

fn parse_chromium_node(
    node: &Value,
    extras: &mut HashMap<String, Map<String, Value>>,
) -> Result<BookmarkNode> {
    let object = node
        .as_object()
        .ok_or_else(|| anyhow!("Bookmark node is not an object"))?;

    let id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Bookmark node without an id"))?
        .to_string();
    let is_folder = object.get("type").and_then(|v| v.as_str()) != Some("url");

    let children = if is_folder {
        let mut parsed = Vec::new();
        for child in object
            .get("children")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
        {
            parsed.push(parse_chromium_node(child, extras)?);
        }
        Some(parsed)
    } else {
        None
    };

    let extra: Map<String, Value> = object
        .iter()
        .filter(|(k, _)| !MODELLED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !extra.is_empty() {
        extras.insert(id.clone(), extra);
    }

    Ok(BookmarkNode {
        title: object
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        url: object.get("url").and_then(|v| v.as_str()).map(str::to_string),
        parent_id: None,
        children,
        id,
    })
}

fn bookmarks_to_chromium_json(state: &ChromiumState) -> Value {
    let mut roots = Map::new();
    for ((key, _, _), root) in ROOT_KEYS.iter().zip(state.tree.roots()) {
        roots.insert(key.to_string(), node_to_chromium_json(root, &state.extras));
    }

    let mut document = state.document.clone();
    document.insert("roots".to_string(), Value::Object(roots));
    document.entry("version").or_insert(json!(1));
    Value::Object(document)
}

fn node_to_chromium_json(node: &BookmarkNode, extras: &HashMap<String, Map<String, Value>>) -> Value {
    let mut object = extras.get(&node.id).cloned().unwrap_or_default();
    object.insert("id".to_string(), json!(node.id));
    object.insert("name".to_string(), json!(node.title));

    match &node.url {
        Some(url) => {
            object.insert("type".to_string(), json!("url"));
            object.insert("url".to_string(), json!(url));
        }
        None => {
            object.insert("type".to_string(), json!("folder"));
            let children: Vec<Value> = node
                .children
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|child| node_to_chromium_json(child, extras))
                .collect();
            object.insert("children".to_string(), Value::Array(children));
        }
    }

    Value::Object(object)
}
