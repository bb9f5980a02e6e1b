//! Writes the JSON and CSV summaries for the committed set.

use std::path::Path;

use cliptriage_core::summary::{Summary, SUMMARY_CSV_FILE_NAME, SUMMARY_JSON_FILE_NAME};

use crate::fs::FileOps;

/// Which summary files made it to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryArtifacts {
    pub json_written: bool,
    pub csv_written: bool,
}

/// Write both summary files under `root`. Failures are logged, not returned.
pub async fn write_summary(
    fs: &dyn FileOps,
    root: &Path,
    summary: &Summary,
) -> SummaryArtifacts {
    let json_written = match summary.to_pretty_json() {
        Ok(json) => write_one(fs, &root.join(SUMMARY_JSON_FILE_NAME), json.as_bytes()).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize triage summary");
            false
        }
    };
    let csv_path = root.join(SUMMARY_CSV_FILE_NAME);
    let csv_written = write_one(fs, &csv_path, summary.to_csv().as_bytes()).await;

    SummaryArtifacts {
        json_written,
        csv_written,
    }
}

async fn write_one(fs: &dyn FileOps, path: &Path, contents: &[u8]) -> bool {
    match fs.write_atomic(path, contents).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write summary file");
            false
        }
    }
}
