//! Load and save triage sessions on disk.

use std::path::Path;

use anyhow::{Context, Result};

use cliptriage_core::session::TriageSession;
use cliptriage_core::ClipRegistry;
use cliptriage_pipeline::FileOps;

pub async fn load(fs: &dyn FileOps, path: &Path) -> Result<ClipRegistry> {
    let json = fs
        .read_to_string(path)
        .await
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    let session = TriageSession::from_json(&json)?;
    Ok(ClipRegistry::from_session(session))
}

pub async fn save(fs: &dyn FileOps, path: &Path, registry: &ClipRegistry) -> Result<()> {
    let json = registry.to_session().to_pretty_json()?;
    fs.write_atomic(path, json.as_bytes())
        .await
        .with_context(|| format!("Failed to write session {}", path.display()))
}
