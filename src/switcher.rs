//! Two-phase bookmark mover behind a profile switch.
//!
//! A switch walks `Idle -> EvacuatingBar -> ImportingProfile -> Committed`.
//! The active pointer is written before any move, so a failed move leaves
//! the tracker on the new profile with the bar partially migrated; the
//! error reports the phase it happened in. No compensating moves are made.

use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::active::ActiveProfileTracker;
use crate::error::{ProfileError, Result};
use crate::folders::FolderResolver;
use crate::store::{BookmarkStore, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPhase {
    Idle,
    EvacuatingBar,
    ImportingProfile,
    Committed,
}

impl SwitchPhase {
    /// Next phase on the single forward path. `Committed` is terminal.
    pub fn advance(self) -> Self {
        match self {
            SwitchPhase::Idle => SwitchPhase::EvacuatingBar,
            SwitchPhase::EvacuatingBar => SwitchPhase::ImportingProfile,
            SwitchPhase::ImportingProfile | SwitchPhase::Committed => SwitchPhase::Committed,
        }
    }
}

impl fmt::Display for SwitchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwitchPhase::Idle => "idle",
            SwitchPhase::EvacuatingBar => "evacuating the bookmarks bar",
            SwitchPhase::ImportingProfile => "importing the profile",
            SwitchPhase::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub from: String,
    pub to: String,
    pub phase: SwitchPhase,
    /// Items moved from the bar into the previous profile
    pub evacuated: usize,
    /// Items moved from the new profile onto the bar
    pub imported: usize,
}

pub struct ProfileSwitcher<S, K> {
    folders: Arc<FolderResolver<S>>,
    tracker: Arc<ActiveProfileTracker<S, K>>,
}

impl<S: BookmarkStore, K: KeyValueStore> ProfileSwitcher<S, K> {
    pub fn new(folders: Arc<FolderResolver<S>>, tracker: Arc<ActiveProfileTracker<S, K>>) -> Self {
        Self { folders, tracker }
    }

    pub async fn switch_to(&self, new_id: &str) -> Result<SwitchReport> {
        let old_id = self.tracker.get_active_profile_id().await?;
        self.tracker.set_active_profile_id(new_id)?;

        let mut report = SwitchReport {
            from: old_id,
            to: new_id.to_string(),
            phase: SwitchPhase::Idle,
            evacuated: 0,
            imported: 0,
        };

        let bar_id = self.folders.layout().bar_id.as_str();

        // Re-selecting the active profile only skips the moves when its
        // folder is empty; leftovers from an interrupted import still go
        // onto the bar.
        if report.from == report.to && self.folders.store().get_children(new_id).await?.is_empty() {
            debug!("Profile {} is already active, nothing to move", new_id);
            report.phase = SwitchPhase::Committed;
            return Ok(report);
        }

        report.phase = report.phase.advance();
        info!("📤 Moving bookmarks bar into profile {}", report.from);
        report.evacuated = self.move_all(bar_id, &report.from, report.phase).await?;

        report.phase = report.phase.advance();
        info!("📥 Moving profile {} onto the bookmarks bar", report.to);
        report.imported = self.move_all(&report.to, bar_id, report.phase).await?;

        report.phase = report.phase.advance();
        info!(
            "✅ Switched {} -> {} ({} out, {} in)",
            report.from, report.to, report.evacuated, report.imported
        );
        Ok(report)
    }

    /// Move every direct child of `from` into `to`. All moves are issued
    /// together and every one is awaited before returning.
    async fn move_all(&self, from: &str, to: &str, phase: SwitchPhase) -> Result<usize> {
        let store = self.folders.store();
        let children = store.get_children(from).await?;

        let results = join_all(children.iter().map(|child| async move {
            store
                .move_node(&child.id, to)
                .await
                .map_err(|source| ProfileError::MoveFailed {
                    phase,
                    node_id: child.id.clone(),
                    parent_id: to.to_string(),
                    source,
                })
        }))
        .await;

        for result in results {
            result?;
        }
        debug!("Moved {} bookmarks from {} to {}", children.len(), from, to);
        Ok(children.len())
    }
}
