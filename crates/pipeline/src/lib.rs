//! Commit pipeline: moves triaged clips into organized folders on disk.
//!
//! - [`orchestrator`]: the commit state machine
//! - [`mover`]: collision-free destinations and verified moves
//! - [`manifest_writer`] / [`summary_writer`]: best-effort artifacts
//! - [`recovery`]: reconcile a manifest with the filesystem
//! - [`fs`]: the filesystem seam all of the above go through

pub mod config;
pub mod error;
pub mod fs;
pub mod manifest_writer;
pub mod mover;
pub mod orchestrator;
pub mod recovery;
pub mod summary_writer;

pub use config::CommitConfig;
pub use error::PipelineError;
pub use fs::{FileOps, TokioFs};
pub use orchestrator::{commit_registry, CommitOrchestrator};
pub use recovery::{inspect_manifest, FileState, RecoveryReport};
