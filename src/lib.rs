//! Named bookmark profiles that can be swapped in and out of the browser
//! bookmarks bar.
//!
//! Profiles live as folders under a single `Switcher-Profiles` folder. A
//! switch parks the bar's current contents in the previously active profile
//! and moves the chosen profile's contents onto the bar.

pub mod active;
pub mod bookmarks;
pub mod chromium;
pub mod config;
pub mod error;
pub mod folders;
pub mod profiles;
pub mod service;
pub mod state;
pub mod store;
pub mod switcher;

pub use active::ActiveProfileTracker;
pub use bookmarks::{BookmarkNode, BookmarkTree, SearchFilter, BOOKMARKS_BAR_ID};
pub use chromium::ChromiumBookmarkStore;
pub use config::{ProfileLayout, SwitcherConfig};
pub use error::{ProfileError, Result};
pub use folders::FolderResolver;
pub use profiles::ProfileRegistry;
pub use service::{ProfileOverview, ProfileService};
pub use state::JsonFileKeyValueStore;
pub use store::{BookmarkStore, KeyValueStore, MemoryBookmarkStore, MemoryKeyValueStore};
pub use switcher::{ProfileSwitcher, SwitchPhase, SwitchReport};
