//! `cliptriage-worker` -- commits saved triage sessions to disk.
//!
//! # Environment variables
//!
//! | Variable                    | Default         | Description                          |
//! |-----------------------------|-----------------|--------------------------------------|
//! | `CLIPTRIAGE_SESSION`        | --              | Session file for `commit`            |
//! | `CLIPTRIAGE_OUTPUT_DIR`     | `.`             | Where the commit root is created     |
//! | `CLIPTRIAGE_ROOT_NAME`      | `Triaged Clips` | Base name of the commit root         |
//! | `CLIPTRIAGE_ORGANIZATION`   | `by-rating`     | `by-rating` or `by-tag`              |
//! | `CLIPTRIAGE_SKIP_UNTOUCHED` | `true`          | Leave unrated, untagged clips alone  |

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use cliptriage_core::CommitResult;
use cliptriage_events::{EventBus, TriageEvent};
use cliptriage_pipeline::{
    commit_registry, inspect_manifest, CommitConfig, CommitOrchestrator, FileOps, RecoveryReport,
};

pub mod cli;
pub mod session_store;

/// Commit the session at `session_path` and write back the clips that
/// remain (failed entries, plus untouched clips when they are kept).
pub async fn run_commit(
    fs: Arc<dyn FileOps>,
    config: CommitConfig,
    session_path: &Path,
) -> Result<CommitResult> {
    let mut registry = session_store::load(fs.as_ref(), session_path).await?;
    tracing::info!(clips = registry.len(), session = %session_path.display(), "Session loaded");

    let bus = Arc::new(EventBus::default());
    let progress = spawn_progress_logger(&bus);

    let orchestrator =
        CommitOrchestrator::with_file_ops(config, Arc::clone(&fs)).with_events(bus);
    let result = commit_registry(&orchestrator, &mut registry).await;
    // Dropping the orchestrator closes the bus and ends the logger.
    drop(orchestrator);
    let _ = progress.await;

    session_store::save(fs.as_ref(), session_path, &registry).await?;
    tracing::info!(remaining = registry.len(), "Session updated");
    Ok(result)
}

pub async fn run_inspect(fs: Arc<dyn FileOps>, root: &Path) -> Result<RecoveryReport> {
    Ok(inspect_manifest(fs.as_ref(), root).await?)
}

fn spawn_progress_logger(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    tracing::trace!(event = %envelope.header_json(), "Event received");
                    if let TriageEvent::EntryResolved {
                        index,
                        total,
                        status,
                        ..
                    } = envelope.event
                    {
                        tracing::info!(entry = index + 1, total, %status, "Entry resolved");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "Progress logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
