//! Transactional commit of a clip snapshot to disk.
//!
//! A commit walks `Idle -> FolderCreated -> ManifestWritten -> Moving(i)
//! -> Finalizing -> Done`. The manifest is written before the first file
//! moves and rewritten after every entry, so an interrupted commit can be
//! reconstructed from disk. Only failure to create the commit folders
//! aborts; every other failure is recorded per entry and the commit
//! carries on.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use cliptriage_core::commit::PlannedClip;
use cliptriage_core::naming::{sanitize_file_name, suffixed_folder_name, MAX_SUFFIX_ATTEMPTS};
use cliptriage_core::summary::{CommittedClip, Summary};
use cliptriage_core::{
    Clip, ClipRegistry, CommitPhase, CommitPlan, CommitResult, EntryStatus, ManifestEntry,
    ManifestStatus,
};
use cliptriage_events::{EventBus, TriageEvent};

use crate::config::{CommitConfig, DEFAULT_ROOT_NAME};
use crate::error::PipelineError;
use crate::fs::{FileOps, TokioFs};
use crate::manifest_writer::ManifestWriter;
use crate::mover::Mover;
use crate::summary_writer::write_summary;

/// Runs commits against a filesystem.
pub struct CommitOrchestrator {
    fs: Arc<dyn FileOps>,
    mover: Mover,
    config: CommitConfig,
    events: Option<Arc<EventBus>>,
    app_version: String,
}

impl CommitOrchestrator {
    /// Orchestrator over the real filesystem.
    pub fn new(config: CommitConfig) -> Self {
        Self::with_file_ops(config, Arc::new(TokioFs))
    }

    pub fn with_file_ops(config: CommitConfig, fs: Arc<dyn FileOps>) -> Self {
        Self {
            mover: Mover::new(Arc::clone(&fs)),
            fs,
            config,
            events: None,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Publish phase, entry, and completion events on `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Version string recorded in the summary.
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    /// Commit `snapshot` and return the aggregate outcome.
    ///
    /// Never fails: a fatal error yields a result with `root: None` and a
    /// single error line. The caller owns registry cleanup, see
    /// [`commit_registry`].
    pub async fn run(&self, snapshot: &[Clip]) -> CommitResult {
        let started_at = Utc::now();
        let options = self.config.options;
        self.enter(CommitPhase::Idle);

        let plan = CommitPlan::new(snapshot, options);
        tracing::info!(
            planned = plan.planned.len(),
            skipped = plan.skipped.len(),
            organization = %options.organization,
            "Starting commit",
        );

        let root = match self.prepare_folders(&plan).await {
            Ok(root) => root,
            Err(e) => {
                tracing::error!(error = %e, "Commit aborted");
                return self.finish(CommitResult::aborted(e.to_string()));
            }
        };
        self.enter(CommitPhase::FolderCreated);

        let mut entries = self.plan_entries(&root, &plan.planned).await;

        let writer = ManifestWriter::new(
            Arc::clone(&self.fs),
            &root,
            started_at,
            options.organization,
        );
        writer.write(&entries, ManifestStatus::InProgress).await;
        self.enter(CommitPhase::ManifestWritten);

        let total = entries.len();
        for index in 0..total {
            self.enter(CommitPhase::Moving { index, total });
            let entry = &mut entries[index];
            if entry.status == EntryStatus::Pending {
                self.mover.move_and_verify(entry).await;
            }
            if let Some(line) = entry.error_line() {
                tracing::warn!(error = %line, "Clip not committed");
            }
            self.publish(TriageEvent::EntryResolved {
                index,
                total,
                clip_id: entry.clip_id,
                status: entry.status,
            });
            writer.write(&entries, ManifestStatus::InProgress).await;
        }

        self.enter(CommitPhase::Finalizing);
        let errors: Vec<String> = entries
            .iter()
            .filter_map(ManifestEntry::error_line)
            .collect();
        writer
            .write(&entries, ManifestStatus::finished(errors.len()))
            .await;

        let committed: Vec<CommittedClip> = plan
            .planned
            .iter()
            .zip(&entries)
            .filter(|(_, entry)| entry.status == EntryStatus::Verified)
            .map(|(p, entry)| CommittedClip {
                clip: p.clip.clone(),
                folder: p.folder.clone(),
                destination: entry.to.clone(),
            })
            .collect();

        let summary = Summary::build(
            &committed,
            options.organization,
            plan.skipped.len(),
            Utc::now(),
            self.app_version.clone(),
        );
        write_summary(self.fs.as_ref(), &root, &summary).await;

        let result = CommitResult {
            moved: committed.len(),
            skipped: plan.skipped.len(),
            errors,
            root: Some(root),
            verified_ids: committed.iter().map(|c| c.clip.id()).collect(),
            skipped_ids: plan.skipped,
        };
        tracing::info!(
            moved = result.moved,
            skipped = result.skipped,
            errors = result.errors.len(),
            "Commit finished",
        );
        self.finish(result)
    }

    /// Create the commit root and every destination subfolder.
    async fn prepare_folders(&self, plan: &CommitPlan) -> Result<PathBuf, PipelineError> {
        let root = self.create_root().await?;
        for folder in plan.folders() {
            let path = root.join(&folder);
            self.fs
                .create_dir_all(&path)
                .await
                .map_err(|source| PipelineError::FolderCreation { path, source })?;
        }
        Ok(root)
    }

    /// Create a fresh root under the output directory, suffixing the name
    /// with ` 1`, ` 2`, ... when it is taken.
    async fn create_root(&self) -> Result<PathBuf, PipelineError> {
        let parent = &self.config.output_dir;
        self.fs
            .create_dir_all(parent)
            .await
            .map_err(|source| PipelineError::RootCreation {
                path: parent.clone(),
                source,
            })?;

        let base = sanitize_file_name(&self.config.root_name, DEFAULT_ROOT_NAME);
        for n in 0..=MAX_SUFFIX_ATTEMPTS {
            let candidate = parent.join(suffixed_folder_name(&base, n));
            if self.fs.exists(&candidate).await {
                continue;
            }
            match self.fs.create_dir(&candidate).await {
                Ok(()) => return Ok(candidate),
                // Lost a race for this name; try the next one.
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(PipelineError::RootCreation {
                        path: candidate,
                        source,
                    })
                }
            }
        }
        Err(PipelineError::NameExhausted {
            dir: parent.clone(),
            name: base,
            attempts: MAX_SUFFIX_ATTEMPTS,
        })
    }

    /// One pending entry per planned clip, with batch-unique destinations.
    async fn plan_entries(&self, root: &Path, planned: &[PlannedClip]) -> Vec<ManifestEntry> {
        let mut assigned = HashSet::new();
        let mut entries = Vec::with_capacity(planned.len());
        for p in planned {
            let dir = root.join(&p.folder);
            let source = p.clip.source_path().to_path_buf();
            let fallback = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "clip".to_string());
            let file_name = sanitize_file_name(&p.clip.display_name, &fallback);

            let entry = match self
                .mover
                .resolve_destination(&dir, &file_name, &mut assigned)
                .await
            {
                Ok(to) => ManifestEntry::planned(
                    p.clip.id(),
                    source,
                    to,
                    p.folder.clone(),
                    p.clip.file_size,
                ),
                Err(e) => {
                    let mut entry = ManifestEntry::planned(
                        p.clip.id(),
                        source,
                        dir.join(&file_name),
                        p.folder.clone(),
                        p.clip.file_size,
                    );
                    entry.mark_failed(e.to_string());
                    entry
                }
            };
            entries.push(entry);
        }
        entries
    }

    fn enter(&self, phase: CommitPhase) {
        tracing::debug!(?phase, "Commit phase");
        self.publish(TriageEvent::CommitPhase(phase));
    }

    fn finish(&self, result: CommitResult) -> CommitResult {
        self.enter(CommitPhase::Done);
        self.publish(TriageEvent::CommitFinished(result.clone()));
        result
    }

    fn publish(&self, event: TriageEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

/// Commit the registry's current clips, then drop the verified clips (and
/// skipped ones, when skipping untouched) from the registry.
///
/// The cleanup is not undoable. Failed clips stay in the registry.
pub async fn commit_registry(
    orchestrator: &CommitOrchestrator,
    registry: &mut ClipRegistry,
) -> CommitResult {
    let snapshot = registry.clips().to_vec();
    let result = orchestrator.run(&snapshot).await;
    let removed = registry.remove_committed(&result.ids_to_remove());
    tracing::debug!(removed = removed.len(), "Registry cleaned up after commit");
    result
}
