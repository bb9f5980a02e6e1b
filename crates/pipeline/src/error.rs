use std::path::PathBuf;

/// Errors raised by the commit pipeline.
///
/// Only fatal-to-commit and inspection failures surface as `Err`. Per-entry
/// move failures are recorded on the manifest entry instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not create commit folder {}: {source}", .path.display())]
    RootCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create folder {}: {source}", .path.display())]
    FolderCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free name for {name} in {} after {attempts} attempts", .dir.display())]
    NameExhausted {
        dir: PathBuf,
        name: String,
        attempts: u32,
    },

    #[error("Manifest not found at {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
