//! Persists the commit manifest under the commit root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cliptriage_core::manifest::MANIFEST_FILE_NAME;
use cliptriage_core::types::Timestamp;
use cliptriage_core::{Manifest, ManifestEntry, ManifestStatus, OrganizationMode};

use crate::fs::FileOps;

/// Writes the manifest for one commit.
///
/// Writes are best-effort: a failure is logged and reported as `false`,
/// never propagated. Each write replaces the whole document atomically.
pub struct ManifestWriter {
    fs: Arc<dyn FileOps>,
    path: PathBuf,
    started_at: Timestamp,
    organization: OrganizationMode,
}

impl ManifestWriter {
    pub fn new(
        fs: Arc<dyn FileOps>,
        root: &Path,
        started_at: Timestamp,
        organization: OrganizationMode,
    ) -> Self {
        Self {
            fs,
            path: root.join(MANIFEST_FILE_NAME),
            started_at,
            organization,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, entries: &[ManifestEntry], status: ManifestStatus) -> bool {
        let manifest = Manifest::build(entries, status, self.started_at, self.organization);
        let json = match manifest.to_pretty_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize commit manifest");
                return false;
            }
        };
        match self.fs.write_atomic(&self.path, json.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to write commit manifest",
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cliptriage_core::types::new_clip_id;
    use cliptriage_core::EntryStatus;

    use super::*;
    use crate::fs::TokioFs;

    #[tokio::test]
    async fn rewrites_reflect_latest_entry_status() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(
            Arc::new(TokioFs),
            dir.path(),
            Utc::now(),
            OrganizationMode::ByRating,
        );
        let mut entries = vec![ManifestEntry::planned(
            new_clip_id(),
            PathBuf::from("/in/a.mov"),
            dir.path().join("5-star/a.mov"),
            "5-star",
            Some(10),
        )];

        assert!(writer.write(&entries, ManifestStatus::InProgress).await);
        entries[0].mark_verified();
        assert!(writer.write(&entries, ManifestStatus::Complete).await);

        let json = std::fs::read_to_string(writer.path()).unwrap();
        let manifest = Manifest::from_json(&json).unwrap();
        assert_eq!(manifest.status, ManifestStatus::Complete);
        assert_eq!(manifest.verified, 1);
        assert_eq!(manifest.files[0].status, EntryStatus::Verified);
    }

    #[tokio::test]
    async fn unwritable_root_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(
            Arc::new(TokioFs),
            &dir.path().join("missing"),
            Utc::now(),
            OrganizationMode::ByTag,
        );
        assert!(!writer.write(&[], ManifestStatus::InProgress).await);
    }
}
