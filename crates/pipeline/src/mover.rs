//! Destination planning and the verified move of a single entry.
//!
//! Destinations are resolved for the whole batch before anything moves, so
//! two clips with the same name land on distinct paths. A move is only
//! considered done once the destination exists and, when the expected
//! size is known, matches it byte for byte.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cliptriage_core::manifest::ManifestEntry;
use cliptriage_core::naming::{collision_candidate, MAX_SUFFIX_ATTEMPTS};
use cliptriage_core::EntryStatus;

use crate::error::PipelineError;
use crate::fs::FileOps;

/// How a file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relocation {
    Renamed,
    /// Rename crossed volumes; the file was copied and the source still
    /// needs removing.
    Copied,
}

/// Moves files through a [`FileOps`] implementation.
#[derive(Clone)]
pub struct Mover {
    fs: Arc<dyn FileOps>,
}

impl Mover {
    pub fn new(fs: Arc<dyn FileOps>) -> Self {
        Self { fs }
    }

    /// Pick a destination for `file_name` in `dir` that neither exists on
    /// disk nor was handed out earlier in this batch.
    ///
    /// Tries `name.ext`, then `name_1.ext`, `name_2.ext`, and so on. The
    /// chosen path is recorded in `assigned`.
    pub async fn resolve_destination(
        &self,
        dir: &Path,
        file_name: &str,
        assigned: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, PipelineError> {
        for n in 0..=MAX_SUFFIX_ATTEMPTS {
            let candidate = collision_candidate(dir, file_name, n);
            if assigned.contains(&candidate) || self.fs.exists(&candidate).await {
                continue;
            }
            assigned.insert(candidate.clone());
            return Ok(candidate);
        }
        Err(PipelineError::NameExhausted {
            dir: dir.to_path_buf(),
            name: file_name.to_string(),
            attempts: MAX_SUFFIX_ATTEMPTS,
        })
    }

    /// Move `entry.from` to `entry.to` and verify the result.
    ///
    /// Updates the entry in place and returns its terminal status. Never
    /// returns an error; failures are recorded on the entry.
    pub async fn move_and_verify(&self, entry: &mut ManifestEntry) -> EntryStatus {
        if !self.fs.exists(&entry.from).await {
            entry.mark_failed("Source file not found");
            return entry.status;
        }
        if self.fs.exists(&entry.to).await {
            entry.mark_failed(format!(
                "Destination already exists: {}",
                entry.to.display()
            ));
            return entry.status;
        }

        let relocation = match self.relocate(&entry.from, &entry.to).await {
            Ok(relocation) => relocation,
            Err(message) => {
                entry.mark_failed(message);
                return entry.status;
            }
        };
        entry.mark_moved();

        if let Err(message) = self.verify(&entry.to, entry.expected_size).await {
            if relocation == Relocation::Copied {
                // The source is intact; drop the bad copy.
                self.discard_copy(&entry.to).await;
            }
            entry.mark_failed(message);
            return entry.status;
        }

        if relocation == Relocation::Copied {
            if let Err(e) = self.fs.remove_file(&entry.from).await {
                // The file must live in exactly one place.
                self.discard_copy(&entry.to).await;
                entry.mark_failed(format!("Source could not be removed: {e}"));
                return entry.status;
            }
        }

        entry.mark_verified();
        tracing::debug!(from = %entry.from.display(), to = %entry.to.display(), "Clip moved");
        entry.status
    }

    /// Rename, or copy when the destination is on another volume.
    async fn relocate(&self, from: &Path, to: &Path) -> Result<Relocation, String> {
        let rename_err = match self.fs.rename(from, to).await {
            Ok(()) => return Ok(Relocation::Renamed),
            Err(e) => e,
        };
        if rename_err.kind() != io::ErrorKind::CrossesDevices {
            return Err(format!("Move failed: {rename_err}"));
        }
        tracing::debug!(error = %rename_err, "Rename crossed volumes, falling back to copy");
        match self.fs.copy(from, to).await {
            Ok(_) => Ok(Relocation::Copied),
            Err(copy_err) => {
                // A failed copy may leave a partial file behind.
                if self.fs.exists(to).await {
                    self.discard_copy(to).await;
                }
                Err(format!("Move failed: {rename_err}; copy failed: {copy_err}"))
            }
        }
    }

    async fn discard_copy(&self, to: &Path) {
        if let Err(e) = self.fs.remove_file(to).await {
            tracing::warn!(path = %to.display(), error = %e, "Failed to remove copied file");
        }
    }

    async fn verify(&self, to: &Path, expected_size: u64) -> Result<(), String> {
        if !self.fs.exists(to).await {
            return Err("Destination missing after move".to_string());
        }
        if expected_size == 0 {
            return Ok(());
        }
        let actual = self
            .fs
            .file_size(to)
            .await
            .map_err(|e| format!("Could not read destination size: {e}"))?;
        if actual != expected_size {
            return Err(format!(
                "Size mismatch: expected {expected_size} bytes, found {actual}"
            ));
        }
        Ok(())
    }
}
