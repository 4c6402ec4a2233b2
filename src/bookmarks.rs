use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Id of the bookmarks bar root in Chromium-based browsers.
pub const BOOKMARKS_BAR_ID: &str = "1";
/// Id of the "Other bookmarks" root. Parentless creates land here.
pub const OTHER_BOOKMARKS_ID: &str = "2";
/// Id of the "Mobile bookmarks" root.
pub const SYNCED_BOOKMARKS_ID: &str = "3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn folder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            url: None,
            children: Some(Vec::new()),
        }
    }

    pub fn link(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
            url: Some(url.into()),
            children: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }

    /// Copy of this node without its subtree, as returned by listing calls.
    pub fn shallow(&self) -> Self {
        Self {
            children: None,
            ..self.clone()
        }
    }
}

/// Query accepted by [`BookmarkStore::search`](crate::store::BookmarkStore::search).
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub title: Option<String>,
}

impl SearchFilter {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    fn matches(&self, node: &BookmarkNode) -> bool {
        match &self.title {
            Some(title) => node.title == *title,
            None => true,
        }
    }
}

/// Ordered in-memory bookmark tree with the primitives the profile engine
/// needs: search, list children, create, move.
///
/// The tree always has the three fixed Chromium roots as top-level folders.
#[derive(Debug, Clone)]
pub struct BookmarkTree {
    roots: Vec<BookmarkNode>,
    next_id: u64,
}

impl Default for BookmarkTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkTree {
    pub fn new() -> Self {
        Self::from_roots(vec![
            BookmarkNode::folder(BOOKMARKS_BAR_ID, "Bookmarks bar"),
            BookmarkNode::folder(OTHER_BOOKMARKS_ID, "Other bookmarks"),
            BookmarkNode::folder(SYNCED_BOOKMARKS_ID, "Mobile bookmarks"),
        ])
    }

    /// Build a tree from its top-level folders, fixing up `parent_id`s and
    /// seeding the id counter past the largest numeric id in use.
    pub fn from_roots(mut roots: Vec<BookmarkNode>) -> Self {
        let mut max_id = 0;
        for root in &mut roots {
            root.parent_id = Some("0".to_string());
            link_parents(root, &mut max_id);
        }
        Self {
            roots,
            next_id: max_id + 1,
        }
    }

    pub fn roots(&self) -> &[BookmarkNode] {
        &self.roots
    }

    pub fn get(&self, id: &str) -> Option<&BookmarkNode> {
        self.roots.iter().find_map(|root| find(root, id))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut BookmarkNode> {
        self.roots.iter_mut().find_map(|root| find_mut(root, id))
    }

    /// Every node matching `filter`, depth-first in listing order.
    pub fn search(&self, filter: &SearchFilter) -> Vec<BookmarkNode> {
        let mut found = Vec::new();
        for root in &self.roots {
            collect_matches(root, filter, &mut found);
        }
        found
    }

    pub fn children(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        let folder = self
            .get(folder_id)
            .ok_or_else(|| anyhow!("Can't find bookmark for id {}", folder_id))?;
        Ok(folder
            .children
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(BookmarkNode::shallow)
            .collect())
    }

    /// Create a folder titled `title` under `parent_id`, or under
    /// "Other bookmarks" when no parent is given.
    pub fn create(&mut self, parent_id: Option<&str>, title: &str) -> Result<BookmarkNode> {
        let parent_id = parent_id.unwrap_or(OTHER_BOOKMARKS_ID).to_string();
        let id = self.next_id.to_string();

        let parent = self
            .get_mut(&parent_id)
            .ok_or_else(|| anyhow!("Can't find parent bookmark for id {}", parent_id))?;
        if !parent.is_folder() {
            bail!("Parent {} is not a folder", parent_id);
        }

        let mut node = BookmarkNode::folder(id, title);
        node.parent_id = Some(parent_id);
        parent.children.get_or_insert_with(Vec::new).push(node.clone());
        self.next_id += 1;

        debug!("Created folder {} '{}'", node.id, node.title);
        Ok(node.shallow())
    }

    /// Re-parent `node_id` as the last child of `new_parent_id`.
    pub fn move_node(&mut self, node_id: &str, new_parent_id: &str) -> Result<()> {
        if self.roots.iter().any(|root| root.id == node_id) {
            bail!("Can't modify the root bookmark folders");
        }

        let node = self
            .get(node_id)
            .ok_or_else(|| anyhow!("Can't find bookmark for id {}", node_id))?;
        if find(node, new_parent_id).is_some() {
            bail!("Can't move bookmark {} into itself or its descendants", node_id);
        }
        match self.get(new_parent_id) {
            Some(parent) if parent.is_folder() => {}
            Some(_) => bail!("Parent {} is not a folder", new_parent_id),
            None => bail!("Can't find parent bookmark for id {}", new_parent_id),
        }

        let mut detached = self
            .detach(node_id)
            .ok_or_else(|| anyhow!("Can't find bookmark for id {}", node_id))?;
        detached.parent_id = Some(new_parent_id.to_string());

        let parent = self
            .get_mut(new_parent_id)
            .ok_or_else(|| anyhow!("Can't find parent bookmark for id {}", new_parent_id))?;
        parent.children.get_or_insert_with(Vec::new).push(detached);
        Ok(())
    }

    fn detach(&mut self, node_id: &str) -> Option<BookmarkNode> {
        self.roots.iter_mut().find_map(|root| detach_from(root, node_id))
    }
}

fn link_parents(node: &mut BookmarkNode, max_id: &mut u64) {
    if let Ok(n) = node.id.parse::<u64>() {
        *max_id = (*max_id).max(n);
    }
    let parent_id = node.id.clone();
    if let Some(children) = node.children.as_mut() {
        for child in children {
            child.parent_id = Some(parent_id.clone());
            link_parents(child, max_id);
        }
    }
}

fn find<'a>(node: &'a BookmarkNode, id: &str) -> Option<&'a BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find_map(|child| find(child, id))
}

fn find_mut<'a>(node: &'a mut BookmarkNode, id: &str) -> Option<&'a mut BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .as_deref_mut()
        .unwrap_or_default()
        .iter_mut()
        .find_map(|child| find_mut(child, id))
}

fn detach_from(node: &mut BookmarkNode, id: &str) -> Option<BookmarkNode> {
    let children = node.children.as_mut()?;
    if let Some(pos) = children.iter().position(|child| child.id == id) {
        return Some(children.remove(pos));
    }
    children.iter_mut().find_map(|child| detach_from(child, id))
}

fn collect_matches(node: &BookmarkNode, filter: &SearchFilter, found: &mut Vec<BookmarkNode>) {
    if filter.matches(node) {
        found.push(node.shallow());
    }
    for child in node.children.as_deref().unwrap_or_default() {
        collect_matches(child, filter, found);
    }
}
