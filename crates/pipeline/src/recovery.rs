//! Reconcile an on-disk manifest with the filesystem after an interrupted
//! commit.
//!
//! The manifest records what was planned and the last known status of
//! each entry. [`inspect_manifest`] checks where each file actually is
//! now, so a caller can report or resume.

use std::path::{Path, PathBuf};

use serde::Serialize;

use cliptriage_core::manifest::MANIFEST_FILE_NAME;
use cliptriage_core::{EntryStatus, Manifest, ManifestStatus};

use crate::error::PipelineError;
use crate::fs::FileOps;

/// Where an entry's file is on disk right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Only the destination exists.
    Completed,
    /// Only the source exists.
    NotStarted,
    /// Both exist, e.g. a copy that never removed its source.
    Duplicated,
    /// Neither exists.
    Missing,
}

impl FileState {
    fn classify(source_exists: bool, destination_exists: bool) -> Self {
        match (source_exists, destination_exists) {
            (false, true) => Self::Completed,
            (true, false) => Self::NotStarted,
            (true, true) => Self::Duplicated,
            (false, false) => Self::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredEntry {
    pub from: PathBuf,
    pub to: PathBuf,
    pub recorded: EntryStatus,
    pub state: FileState,
}

impl RecoveredEntry {
    /// The manifest disagrees with the filesystem.
    pub fn is_inconsistent(&self) -> bool {
        match self.recorded {
            EntryStatus::Verified => self.state != FileState::Completed,
            EntryStatus::Pending => self.state != FileState::NotStarted,
            EntryStatus::Moved | EntryStatus::Failed => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryReport {
    pub manifest_path: PathBuf,
    pub status: ManifestStatus,
    pub entries: Vec<RecoveredEntry>,
}

impl RecoveryReport {
    /// The commit never reached its final manifest write.
    pub fn was_interrupted(&self) -> bool {
        self.status == ManifestStatus::InProgress
    }

    pub fn count(&self, state: FileState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    /// Entries whose source is still in place and could be retried.
    pub fn resumable(&self) -> impl Iterator<Item = &RecoveredEntry> {
        self.entries
            .iter()
            .filter(|e| e.state == FileState::NotStarted)
    }
}

/// Read the manifest under `root` and classify every entry against disk.
pub async fn inspect_manifest(
    fs: &dyn FileOps,
    root: &Path,
) -> Result<RecoveryReport, PipelineError> {
    let manifest_path = root.join(MANIFEST_FILE_NAME);
    if !fs.exists(&manifest_path).await {
        return Err(PipelineError::ManifestMissing(manifest_path));
    }
    let json = fs.read_to_string(&manifest_path).await?;
    let manifest = Manifest::from_json(&json)?;

    let mut entries = Vec::with_capacity(manifest.files.len());
    for file in manifest.files {
        let source_exists = fs.exists(&file.from).await;
        let destination_exists = fs.exists(&file.to).await;
        let state = FileState::classify(source_exists, destination_exists);
        entries.push(RecoveredEntry {
            from: file.from,
            to: file.to,
            recorded: file.status,
            state,
        });
    }

    let report = RecoveryReport {
        manifest_path,
        status: manifest.status,
        entries,
    };
    tracing::info!(
        interrupted = report.was_interrupted(),
        completed = report.count(FileState::Completed),
        not_started = report.count(FileState::NotStarted),
        "Inspected commit manifest",
    );
    Ok(report)
}
