//! Clip triage domain logic.
//!
//! Pure, filesystem-free building blocks shared by the commit pipeline and
//! any front end:
//!
//! - [`clip`]: clip records, ratings, probe facts
//! - [`edit`] / [`edit_log`]: reversible actions and bounded history
//! - [`registry`]: the single-owner clip store with undo/redo
//! - [`destination`]: folder placement per organization mode
//! - [`naming`]: collision suffixes and folder-name sanitizing
//! - [`manifest`]: the durable commit manifest document
//! - [`summary`]: JSON/CSV metadata for the committed set
//! - [`commit`]: planning and result types
//! - [`session`]: persistable registry snapshot

pub mod clip;
pub mod commit;
pub mod destination;
pub mod edit;
pub mod edit_log;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod registry;
pub mod session;
pub mod summary;
pub mod types;

pub use clip::{Clip, ProbeInfo, Rating, Resolution};
pub use commit::{CommitOptions, CommitPhase, CommitPlan, CommitResult};
pub use destination::OrganizationMode;
pub use edit::EditAction;
pub use error::CoreError;
pub use manifest::{EntryStatus, Manifest, ManifestEntry, ManifestStatus};
pub use registry::{ChangeObserver, ClipRegistry, RegistryChange};
pub use types::ClipId;
