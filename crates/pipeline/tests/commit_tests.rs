//! End-to-end commit scenarios against a temporary directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use tempfile::TempDir;

use cliptriage_core::manifest::MANIFEST_FILE_NAME;
use cliptriage_core::summary::{SUMMARY_CSV_FILE_NAME, SUMMARY_JSON_FILE_NAME};
use cliptriage_core::{
    Clip, ClipRegistry, CommitOptions, CommitPhase, EntryStatus, Manifest, ManifestStatus,
    OrganizationMode, Rating,
};
use cliptriage_events::{Envelope, EventBus, TriageEvent};
use cliptriage_pipeline::{
    commit_registry, inspect_manifest, CommitConfig, CommitOrchestrator, FileOps, FileState,
    TokioFs,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("footage")).unwrap();
        Self { dir }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn root(&self) -> PathBuf {
        self.out().join("Triaged Clips")
    }

    /// Write a source clip and return a `Clip` with its real size.
    fn clip(&self, relative: &str, bytes: &[u8]) -> Clip {
        let path = self.dir.path().join("footage").join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        Clip::new(path).with_file_size(bytes.len() as u64)
    }

    fn config(&self, organization: OrganizationMode) -> CommitConfig {
        CommitConfig {
            output_dir: self.out(),
            root_name: "Triaged Clips".into(),
            options: CommitOptions {
                organization,
                skip_untouched: true,
            },
        }
    }
}

fn rating(n: u8) -> Rating {
    Rating::new(n).unwrap()
}

fn read_manifest(root: &Path) -> Manifest {
    let json =
        std::fs::read_to_string(root.join(MANIFEST_FILE_NAME)).expect("manifest on disk");
    Manifest::from_json(&json).expect("valid manifest")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commits_rated_and_tagged_clips_and_skips_untouched() {
    let ws = Workspace::new();
    let a = ws.clip("a.mov", b"aaaaa").with_rating(rating(5));
    let b = ws.clip("b.mov", b"bbb").with_tags(["Dunk"]);
    let c = ws.clip("c.mov", b"c");
    let c_path = c.source_path().to_path_buf();

    let mut registry = ClipRegistry::new();
    registry.add_clips(vec![a, b, c]);

    let orchestrator = CommitOrchestrator::new(ws.config(OrganizationMode::ByTag));
    let result = commit_registry(&orchestrator, &mut registry).await;

    assert!(result.is_clean(), "errors: {:?}", result.errors);
    assert_eq!(result.moved, 2);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.root.as_deref(), Some(ws.root().as_path()));

    assert!(ws.root().join("5-star/a.mov").exists());
    assert!(ws.root().join("Dunk/b.mov").exists());
    assert!(c_path.exists(), "untouched clip stays in place");
    assert!(registry.is_empty());

    let manifest = read_manifest(&ws.root());
    assert_eq!(manifest.status, ManifestStatus::Complete);
    assert_eq!(manifest.verified, 2);
    assert_eq!(manifest.pending, 0);

    let json = std::fs::read_to_string(ws.root().join(SUMMARY_JSON_FILE_NAME)).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(summary["ratingSummary"], serde_json::json!({"5-star": 1}));
    assert_eq!(summary["tagSummary"], serde_json::json!({"Dunk": 1}));
    assert_eq!(summary["skippedUntouched"], 1);
}

#[tokio::test]
async fn same_named_clips_get_distinct_destinations() {
    let ws = Workspace::new();
    let first = ws.clip("day1/clip.mov", b"one").with_rating(rating(3));
    let second = ws.clip("day2/clip.mov", b"two").with_rating(rating(3));

    let orchestrator = CommitOrchestrator::new(ws.config(OrganizationMode::ByRating));
    let result = orchestrator.run(&[first, second]).await;

    assert_eq!(result.moved, 2);
    let folder = ws.root().join("3-star");
    assert_eq!(std::fs::read(folder.join("clip.mov")).unwrap(), b"one");
    assert_eq!(std::fs::read(folder.join("clip_1.mov")).unwrap(), b"two");

    let manifest = read_manifest(&ws.root());
    assert_ne!(manifest.files[0].to, manifest.files[1].to);
}

#[tokio::test]
async fn size_mismatch_keeps_clip_in_registry() {
    let ws = Workspace::new();
    let good = ws.clip("good.mov", b"12345").with_rating(rating(4));
    let bad = ws
        .clip("bad.mov", b"12345")
        .with_rating(rating(4))
        .with_file_size(9_999);
    let bad_id = bad.id();

    let mut registry = ClipRegistry::new();
    registry.add_clips(vec![good, bad]);

    let orchestrator = CommitOrchestrator::new(ws.config(OrganizationMode::ByRating));
    let result = commit_registry(&orchestrator, &mut registry).await;

    assert_eq!(result.moved, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("bad.mov: Size mismatch"));
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(bad_id));

    let manifest = read_manifest(&ws.root());
    assert_eq!(manifest.status, ManifestStatus::CompleteWithErrors);
    assert_eq!(manifest.failed, 1);
    assert_matches!(
        manifest.files.iter().find(|f| f.status == EntryStatus::Failed),
        Some(entry) if entry.error.as_deref().is_some_and(|e| e.contains("expected 9999"))
    );
}

#[tokio::test]
async fn unrated_untouched_clips_move_when_not_skipping() {
    let ws = Workspace::new();
    let plain = ws.clip("plain.mp4", b"p");
    let mut config = ws.config(OrganizationMode::ByRating);
    config.options.skip_untouched = false;

    let result = CommitOrchestrator::new(config).run(&[plain]).await;

    assert_eq!(result.moved, 1);
    assert_eq!(result.skipped, 0);
    assert!(ws.root().join("Unrated/plain.mp4").exists());
}

#[tokio::test]
async fn existing_root_gets_numeric_suffix() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.root()).unwrap();
    let clip = ws.clip("a.mov", b"a").with_rating(rating(1));

    let result = CommitOrchestrator::new(ws.config(OrganizationMode::ByRating))
        .run(&[clip])
        .await;

    let expected = ws.out().join("Triaged Clips 1");
    assert_eq!(result.root.as_deref(), Some(expected.as_path()));
    assert!(expected.join("1-star/a.mov").exists());
}

#[tokio::test]
async fn root_creation_failure_aborts_without_manifest() {
    let ws = Workspace::new();
    let blocker = ws.dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let clip = ws.clip("a.mov", b"a").with_rating(rating(2));
    let source = clip.source_path().to_path_buf();

    let mut registry = ClipRegistry::new();
    registry.add_clips(vec![clip]);

    let mut config = ws.config(OrganizationMode::ByRating);
    config.output_dir = blocker.join("out");
    let result = commit_registry(&CommitOrchestrator::new(config), &mut registry).await;

    assert_eq!(result.moved, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.root.is_none());
    assert_eq!(registry.len(), 1);
    assert!(source.exists());
    assert!(!blocker.join("out").exists());
}

// ---------------------------------------------------------------------------
// Manifest precedes mutation
// ---------------------------------------------------------------------------

/// Simulates a crash at the first move: snapshots the manifest on disk,
/// then refuses every rename and copy.
struct CrashBeforeMoveFs {
    manifest_path: PathBuf,
    seen: Mutex<Option<Manifest>>,
}

#[async_trait]
impl FileOps for CrashBeforeMoveFs {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        TokioFs.create_dir(path).await
    }
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        TokioFs.create_dir_all(path).await
    }
    async fn exists(&self, path: &Path) -> bool {
        TokioFs.exists(path).await
    }
    async fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        let mut seen = self.seen.lock().unwrap();
        if seen.is_none() {
            *seen = Some(read_manifest(self.manifest_path.parent().unwrap()));
        }
        Err(io::Error::new(io::ErrorKind::Interrupted, "simulated crash"))
    }
    async fn copy(&self, _from: &Path, _to: &Path) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Interrupted, "simulated crash"))
    }
    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        TokioFs.remove_file(path).await
    }
    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        TokioFs.file_size(path).await
    }
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        TokioFs.write_atomic(path, contents).await
    }
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        TokioFs.read_to_string(path).await
    }
}

#[tokio::test]
async fn manifest_lists_every_entry_pending_before_first_move() {
    let ws = Workspace::new();
    let clips = vec![
        ws.clip("a.mov", b"a").with_rating(rating(5)),
        ws.clip("b.mov", b"b").with_tags(["Block"]),
    ];
    let sources: Vec<PathBuf> = clips
        .iter()
        .map(|c| c.source_path().to_path_buf())
        .collect();

    let fs = Arc::new(CrashBeforeMoveFs {
        manifest_path: ws.root().join(MANIFEST_FILE_NAME),
        seen: Mutex::new(None),
    });
    let orchestrator =
        CommitOrchestrator::with_file_ops(ws.config(OrganizationMode::ByTag), fs.clone());
    let result = orchestrator.run(&clips).await;

    let at_first_move = fs
        .seen
        .lock()
        .unwrap()
        .take()
        .expect("manifest read at first move");
    assert_eq!(at_first_move.status, ManifestStatus::InProgress);
    assert_eq!(at_first_move.total_planned, 2);
    assert!(at_first_move
        .files
        .iter()
        .all(|f| f.status == EntryStatus::Pending));

    // Filesystem first: nothing moved.
    assert_eq!(result.moved, 0);
    assert!(sources.iter().all(|p| p.exists()));

    // Then the manifest agrees with it.
    let report = inspect_manifest(&TokioFs, &ws.root()).await.unwrap();
    assert_eq!(report.count(FileState::NotStarted), 2);
    assert_eq!(report.resumable().count(), 2);
    assert!(report.entries.iter().all(|e| !e.is_inconsistent()));
}

#[tokio::test]
async fn tag_named_like_the_manifest_does_not_displace_it() {
    let ws = Workspace::new();
    let clip = ws
        .clip("a.mov", b"aaa")
        .with_rating(rating(5))
        .with_tags([MANIFEST_FILE_NAME]);

    let result = CommitOrchestrator::new(ws.config(OrganizationMode::ByTag))
        .run(&[clip])
        .await;

    assert_eq!(result.moved, 1);
    assert!(ws.root().join(MANIFEST_FILE_NAME).is_file());
    assert!(ws.root().join("5-star/a.mov").exists());
    let manifest = read_manifest(&ws.root());
    assert_eq!(manifest.status, ManifestStatus::Complete);
    assert_eq!(manifest.files[0].folder, "5-star");
}

// ---------------------------------------------------------------------------
// Best-effort artifacts and fatal folder errors
// ---------------------------------------------------------------------------

type PathRule = fn(&Path) -> bool;

/// Real filesystem, except that `write_atomic` and `create_dir_all` fail
/// for paths matching the given rules.
struct SelectiveFailFs {
    fail_write: PathRule,
    fail_create_dir_all: PathRule,
}

impl SelectiveFailFs {
    fn new(fail_write: PathRule, fail_create_dir_all: PathRule) -> Arc<Self> {
        Arc::new(Self {
            fail_write,
            fail_create_dir_all,
        })
    }
}

fn never(_: &Path) -> bool {
    false
}

fn always(_: &Path) -> bool {
    true
}

fn is_summary_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == SUMMARY_JSON_FILE_NAME || n == SUMMARY_CSV_FILE_NAME)
}

fn is_five_star_folder(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == "5-star")
}

fn refused() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "refused")
}

#[async_trait]
impl FileOps for SelectiveFailFs {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        TokioFs.create_dir(path).await
    }
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if (self.fail_create_dir_all)(path) {
            return Err(refused());
        }
        TokioFs.create_dir_all(path).await
    }
    async fn exists(&self, path: &Path) -> bool {
        TokioFs.exists(path).await
    }
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        TokioFs.rename(from, to).await
    }
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        TokioFs.copy(from, to).await
    }
    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        TokioFs.remove_file(path).await
    }
    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        TokioFs.file_size(path).await
    }
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if (self.fail_write)(path) {
            return Err(refused());
        }
        TokioFs.write_atomic(path, contents).await
    }
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        TokioFs.read_to_string(path).await
    }
}

#[tokio::test]
async fn manifest_write_failures_do_not_stop_the_commit() {
    let ws = Workspace::new();
    let clips = vec![
        ws.clip("a.mov", b"aa").with_rating(rating(5)),
        ws.clip("b.mov", b"bb").with_rating(rating(2)),
    ];

    let orchestrator = CommitOrchestrator::with_file_ops(
        ws.config(OrganizationMode::ByRating),
        SelectiveFailFs::new(always, never),
    );
    let result = orchestrator.run(&clips).await;

    assert_eq!(result.moved, 2);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.verified_ids.len(), 2);
    assert!(ws.root().join("5-star/a.mov").exists());
    assert!(ws.root().join("2-star/b.mov").exists());
    assert!(!ws.root().join(MANIFEST_FILE_NAME).exists());
}

#[tokio::test]
async fn summary_write_failure_keeps_manifest_and_moves() {
    let ws = Workspace::new();
    let clip = ws.clip("a.mov", b"aa").with_tags(["Dunk"]);

    let orchestrator = CommitOrchestrator::with_file_ops(
        ws.config(OrganizationMode::ByTag),
        SelectiveFailFs::new(is_summary_file, never),
    );
    let result = orchestrator.run(&[clip]).await;

    assert_eq!(result.moved, 1);
    assert!(result.is_clean());
    assert_eq!(read_manifest(&ws.root()).status, ManifestStatus::Complete);
    assert!(!ws.root().join(SUMMARY_JSON_FILE_NAME).exists());
    assert!(!ws.root().join(SUMMARY_CSV_FILE_NAME).exists());
}

#[tokio::test]
async fn subfolder_creation_failure_aborts_before_manifest() {
    let ws = Workspace::new();
    let clip = ws.clip("a.mov", b"aa").with_rating(rating(5));
    let source = clip.source_path().to_path_buf();

    let mut registry = ClipRegistry::new();
    registry.add_clips(vec![clip]);

    let orchestrator = CommitOrchestrator::with_file_ops(
        ws.config(OrganizationMode::ByRating),
        SelectiveFailFs::new(never, is_five_star_folder),
    );
    let result = commit_registry(&orchestrator, &mut registry).await;

    assert_eq!(result.moved, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.root.is_none());
    assert_eq!(registry.len(), 1);
    assert!(source.exists());
    assert!(!ws.root().join(MANIFEST_FILE_NAME).exists());
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Envelope>) -> Vec<TriageEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

#[tokio::test]
async fn publishes_phases_in_order() {
    let ws = Workspace::new();
    let clip = ws.clip("a.mov", b"a").with_rating(rating(2));
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();

    let orchestrator =
        CommitOrchestrator::new(ws.config(OrganizationMode::ByRating)).with_events(bus);
    orchestrator.run(&[clip]).await;

    let events = drain(&mut rx);
    let phases: Vec<CommitPhase> = events
        .iter()
        .filter_map(|e| match e {
            TriageEvent::CommitPhase(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            CommitPhase::Idle,
            CommitPhase::FolderCreated,
            CommitPhase::ManifestWritten,
            CommitPhase::Moving { index: 0, total: 1 },
            CommitPhase::Finalizing,
            CommitPhase::Done,
        ]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        TriageEvent::EntryResolved { status: EntryStatus::Verified, .. }
    )));
    assert_matches!(events.last(), Some(TriageEvent::CommitFinished(r)) if r.moved == 1);
}
