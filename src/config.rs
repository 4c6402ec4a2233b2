use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::bookmarks::BOOKMARKS_BAR_ID;

pub const PROFILE_FOLDER_NAME: &str = "Switcher-Profiles";
pub const DEFAULT_FOLDER_NAME: &str = "Default";
pub const ACTIVE_PROFILE_KEY: &str = "active_profile";

/// Where the profile engine finds its folders in the bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLayout {
    /// Title of the folder holding every profile folder.
    pub root_title: String,
    /// Title of the profile holding bookmarks that predate profile management.
    pub default_title: String,
    /// Id of the live bookmarks bar.
    pub bar_id: String,
    /// Key under which the active profile id is persisted.
    pub active_key: String,
}

impl Default for ProfileLayout {
    fn default() -> Self {
        Self {
            root_title: PROFILE_FOLDER_NAME.to_string(),
            default_title: DEFAULT_FOLDER_NAME.to_string(),
            bar_id: BOOKMARKS_BAR_ID.to_string(),
            active_key: ACTIVE_PROFILE_KEY.to_string(),
        }
    }
}

/// Runtime configuration of the CLI.
#[derive(Debug, Clone)]
pub struct SwitcherConfig {
    pub bookmarks_file: PathBuf,
    pub state_file: PathBuf,
    pub layout: ProfileLayout,
}

impl SwitcherConfig {
    /// Build a config, filling unset paths with defaults under `$HOME`.
    pub fn new(
        bookmarks_file: Option<PathBuf>,
        state_file: Option<PathBuf>,
        layout: ProfileLayout,
    ) -> Result<Self> {
        let bookmarks_file = match bookmarks_file {
            Some(path) => path,
            None => Self::data_dir()?.join("Bookmarks"),
        };
        let state_file = match state_file {
            Some(path) => path,
            None => Self::data_dir()?.join("state.json"),
        };

        Ok(Self {
            bookmarks_file,
            state_file,
            layout,
        })
    }

    fn data_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set; pass explicit file paths")?;
        Ok(PathBuf::from(home).join(".bookmark-profiles"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_chromium_bar() {
        let layout = ProfileLayout::default();
        assert_eq!(layout.root_title, "Switcher-Profiles");
        assert_eq!(layout.default_title, "Default");
        assert_eq!(layout.bar_id, "1");
        assert_eq!(layout.active_key, "active_profile");
    }

    #[test]
    fn test_explicit_paths_are_kept() {
        let config = SwitcherConfig::new(
            Some(PathBuf::from("/tmp/b/Bookmarks")),
            Some(PathBuf::from("/tmp/b/state.json")),
            ProfileLayout::default(),
        )
        .unwrap();
        assert_eq!(config.bookmarks_file, PathBuf::from("/tmp/b/Bookmarks"));
        assert_eq!(config.state_file, PathBuf::from("/tmp/b/state.json"));
    }
}
