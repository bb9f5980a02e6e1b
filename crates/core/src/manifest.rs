//! Commit manifest document model.
//!
//! The manifest is the durable record of every planned move in one commit.
//! It is written before any file is touched and rewritten after each entry
//! resolves, so the copy on disk always reflects the true state of every
//! file as of the last successful write. Writing is the pipeline's job;
//! this module only defines the document and its JSON form.
//!
//! File layout (pretty-printed, keys sorted):
//!
//! ```json
//! {
//!   "failed": 0,
//!   "files": [
//!     {
//!       "expectedSize": 1024,
//!       "folder": "5-star",
//!       "from": "...",
//!       "status": "verified",
//!       "to": "..."
//!     }
//!   ],
//!   "moved": 0,
//!   "organization": "by-rating",
//!   "pending": 0,
//!   "startedAt": "2026-01-01T12:00:00Z",
//!   "status": "complete",
//!   "totalPlanned": 1,
//!   "verified": 1
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::destination::OrganizationMode;
use crate::types::{ClipId, Timestamp};

/// Well-known manifest file name inside the commit root.
pub const MANIFEST_FILE_NAME: &str = "_commit_manifest.json";

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Lifecycle of one planned move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    /// Relocated but not yet verified.
    Moved,
    /// Relocated and passed existence and size checks.
    Verified,
    Failed,
}

impl EntryStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Moved => "moved",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }

    /// `true` once the entry will not change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Overall state of a commit as recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    InProgress,
    Complete,
    CompleteWithErrors,
}

impl ManifestStatus {
    /// Final status for a finished commit.
    pub fn finished(error_count: usize) -> Self {
        if error_count == 0 {
            Self::Complete
        } else {
            Self::CompleteWithErrors
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One planned move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Registry identity of the clip. Kept in memory only.
    #[serde(skip)]
    pub clip_id: Option<ClipId>,
    pub from: PathBuf,
    pub to: PathBuf,
    pub folder: String,
    /// Expected byte size; `0` when unknown.
    pub expected_size: u64,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ManifestEntry {
    /// A pending entry for a planned move.
    pub fn planned(
        clip_id: ClipId,
        from: PathBuf,
        to: PathBuf,
        folder: impl Into<String>,
        expected_size: Option<u64>,
    ) -> Self {
        Self {
            clip_id: Some(clip_id),
            from,
            to,
            folder: folder.into(),
            expected_size: expected_size.unwrap_or(0),
            status: EntryStatus::Pending,
            error: None,
        }
    }

    pub fn mark_moved(&mut self) {
        self.status = EntryStatus::Moved;
        self.error = None;
    }

    pub fn mark_verified(&mut self) {
        self.status = EntryStatus::Verified;
        self.error = None;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = EntryStatus::Failed;
        self.error = Some(message.into());
    }

    /// Human-readable error line for the commit result.
    pub fn error_line(&self) -> Option<String> {
        let message = self.error.as_deref()?;
        let name = self
            .from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.from.display().to_string());
        Some(format!("{name}: {message}"))
    }
}

/// Per-status entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub moved: usize,
    pub verified: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn tally(entries: &[ManifestEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match entry.status {
                EntryStatus::Pending => counts.pending += 1,
                EntryStatus::Moved => counts.moved += 1,
                EntryStatus::Verified => counts.verified += 1,
                EntryStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The serialized manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub status: ManifestStatus,
    pub started_at: Timestamp,
    pub organization: OrganizationMode,
    pub total_planned: usize,
    pub moved: usize,
    pub verified: usize,
    pub failed: usize,
    pub pending: usize,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    /// Snapshot `entries` into a document with aggregate counts.
    pub fn build(
        entries: &[ManifestEntry],
        status: ManifestStatus,
        started_at: Timestamp,
        organization: OrganizationMode,
    ) -> Self {
        let counts = StatusCounts::tally(entries);
        Self {
            status,
            started_at,
            organization,
            total_planned: entries.len(),
            moved: counts.moved,
            verified: counts.verified,
            failed: counts.failed,
            pending: counts.pending,
            files: entries.to_vec(),
        }
    }

    /// Pretty JSON with keys in sorted order.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        // `serde_json::Value` objects are ordered maps, which sorts keys.
        let value = serde_json::to_value(self)?;
        serde_json::to_string_pretty(&value)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
