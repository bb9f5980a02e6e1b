//! Commit planning and result types.
//!
//! Planning is pure: it splits a registry snapshot into the clips that will
//! move (with their destination folder) and the untouched clips that are
//! skipped. The async execution lives in the pipeline crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::destination::{folder_for, OrganizationMode};
use crate::types::ClipId;

/// Caller choices for one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOptions {
    pub organization: OrganizationMode,
    /// Leave clips with no rating and no tags in place, and drop them from
    /// the registry afterwards.
    pub skip_untouched: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            organization: OrganizationMode::ByRating,
            skip_untouched: true,
        }
    }
}

/// States the commit orchestrator moves through. `Done` is always reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CommitPhase {
    Idle,
    FolderCreated,
    ManifestWritten,
    Moving { index: usize, total: usize },
    Finalizing,
    Done,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A clip scheduled to move, with its destination folder name.
#[derive(Debug, Clone)]
pub struct PlannedClip {
    pub clip: Clip,
    pub folder: String,
}

/// Snapshot split into moves and skips, in registry order.
#[derive(Debug, Clone, Default)]
pub struct CommitPlan {
    pub planned: Vec<PlannedClip>,
    pub skipped: Vec<ClipId>,
}

impl CommitPlan {
    pub fn new(snapshot: &[Clip], options: CommitOptions) -> Self {
        let mut plan = Self::default();
        for clip in snapshot {
            if options.skip_untouched && clip.is_untouched() {
                plan.skipped.push(clip.id());
                continue;
            }
            plan.planned.push(PlannedClip {
                clip: clip.clone(),
                folder: folder_for(clip, options.organization),
            });
        }
        plan
    }

    /// Distinct destination folders in first-seen order.
    pub fn folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = Vec::new();
        for p in &self.planned {
            if !folders.contains(&p.folder) {
                folders.push(p.folder.clone());
            }
        }
        folders
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Aggregate outcome of one commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    /// Entries moved and verified.
    pub moved: usize,
    /// Untouched clips left in place.
    pub skipped: usize,
    /// One human-readable line per failure.
    pub errors: Vec<String>,
    /// Commit root, or `None` when it could not be created.
    pub root: Option<PathBuf>,
    /// Clips whose entries reached `verified`.
    pub verified_ids: Vec<ClipId>,
    /// Untouched clips that were skipped.
    pub skipped_ids: Vec<ClipId>,
}

impl CommitResult {
    /// Result for a commit that could not create its root folder.
    pub fn aborted(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ids to drop from the registry: verified clips, plus skipped clips
    /// when the caller asked to skip untouched ones.
    pub fn ids_to_remove(&self) -> Vec<ClipId> {
        self.verified_ids
            .iter()
            .chain(self.skipped_ids.iter())
            .copied()
            .collect()
    }
}
