//! Clip triage event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TriageEvent`]: registry changes and commit progress.
//!
//! The bus implements the registry's [`ChangeObserver`] seam, so a front
//! end can subscribe once and receive both edit notifications and commit
//! progress.
//!
//! [`ChangeObserver`]: cliptriage_core::ChangeObserver

pub mod bus;

pub use bus::{Envelope, EventBus, TriageEvent};
