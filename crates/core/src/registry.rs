//! The authoritative in-memory clip set and its undoable mutators.
//!
//! [`ClipRegistry`] has a single owner. Callers marshal onto that owner
//! before mutating, so there is no internal locking. Every user-facing
//! mutation records an [`EditAction`] on the owned [`EditLog`]; undo and redo
//! replay those actions through [`ClipRegistry::apply`].
//!
//! Operations on ids that are no longer registered are silently ignored:
//! the UI may race with removal or commit.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::clip::{preserve_extension, Clip, ProbeInfo, Rating};
use crate::edit::{Direction, EditAction, TagAssignment};
use crate::edit_log::EditLog;
use crate::types::ClipId;

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

/// A change the registry has just applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryChange {
    ClipsAdded(Vec<ClipId>),
    ClipsRemoved(Vec<ClipId>),
    ClipUpdated(ClipId),
    MetricUpdated(ClipId),
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// Receives registry changes after they are applied.
///
/// Implemented for plain closures and, in the events crate, for the event
/// bus. Observers must not call back into the registry.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, change: &RegistryChange);
}

impl<F> ChangeObserver for F
where
    F: Fn(&RegistryChange) + Send + Sync,
{
    fn on_change(&self, change: &RegistryChange) {
        self(change)
    }
}

// ---------------------------------------------------------------------------
// ClipRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ClipRegistry {
    clips: Vec<Clip>,
    metrics: HashMap<ClipId, serde_json::Value>,
    log: EditLog,
    observer: Option<Arc<dyn ChangeObserver>>,
}

impl ClipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose undo history keeps `capacity` actions.
    pub fn with_undo_capacity(capacity: usize) -> Self {
        Self {
            log: EditLog::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Install the observer that receives every subsequent change.
    pub fn set_observer(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observer = Some(observer);
    }

    // -- Queries -------------------------------------------------------------

    /// All clips in display order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id() == id)
    }

    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id() == id)
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// The undo/redo history.
    pub fn history(&self) -> &EditLog {
        &self.log
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.log.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.log.redo_depth()
    }

    // -- Undoable mutations --------------------------------------------------

    /// Register a single clip. Returns `false` if it was already present.
    pub fn add(&mut self, clip: Clip) -> bool {
        !self.add_clips(vec![clip]).is_empty()
    }

    /// Register newly discovered clips as one undoable action.
    ///
    /// Clips whose id or source path is already registered are skipped.
    /// Returns the ids actually added.
    pub fn add_clips(&mut self, clips: Vec<Clip>) -> Vec<ClipId> {
        let mut ids = Vec::with_capacity(clips.len());
        for clip in clips {
            let duplicate = self
                .clips
                .iter()
                .any(|c| c.id() == clip.id() || c.source_path() == clip.source_path());
            if duplicate {
                tracing::debug!(
                    path = %clip.source_path().display(),
                    "Skipping already registered clip",
                );
                continue;
            }
            ids.push(clip.id());
            self.clips.push(clip);
        }
        if ids.is_empty() {
            return ids;
        }
        self.notify(RegistryChange::ClipsAdded(ids.clone()));
        self.record(EditAction::AddClips {
            ids: ids.clone(),
            undone: Vec::new(),
        });
        ids
    }

    /// Remove a clip, keeping a snapshot so the removal can be undone.
    pub fn remove(&mut self, id: ClipId) -> Option<Clip> {
        let Some(index) = self.index_of(id) else {
            Self::stale(id, "remove");
            return None;
        };
        let clip = self.clips[index].clone();
        let mut action = EditAction::RemoveClip {
            clip: clip.clone(),
            index,
        };
        self.apply(&mut action, Direction::Forward);
        self.record(action);
        Some(clip)
    }

    /// Set a clip's rating with click-to-clear semantics: requesting the
    /// rating the clip already has clears it to unrated.
    ///
    /// Returns the rating the clip ends up with.
    pub fn set_rating(&mut self, id: ClipId, requested: Rating) -> Option<Rating> {
        let Some(clip) = self.get(id) else {
            Self::stale(id, "set_rating");
            return None;
        };
        let old = clip.rating;
        let new = if requested == old {
            Rating::UNRATED
        } else {
            requested
        };
        if new != old {
            let mut action = EditAction::SetRating {
                clip_id: id,
                old,
                new,
            };
            self.apply(&mut action, Direction::Forward);
            self.record(action);
        }
        Some(new)
    }

    /// Add `tag` if the clip lacks it, remove it otherwise.
    ///
    /// Returns `Some(true)` when the tag was added, `Some(false)` when removed.
    pub fn toggle_tag(&mut self, id: ClipId, tag: &str) -> Option<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let Some(clip) = self.get(id) else {
            Self::stale(id, "toggle_tag");
            return None;
        };
        let (was_added, position) = match clip.tag_position(tag) {
            Some(position) => (false, position),
            None => (true, clip.tags.len()),
        };
        let mut action = EditAction::ToggleTag {
            clip_id: id,
            tag: tag.to_string(),
            was_added,
            position,
        };
        self.apply(&mut action, Direction::Forward);
        self.record(action);
        Some(was_added)
    }

    /// Remove `tag` if present. Recorded as a tag toggle that removed it.
    pub fn remove_tag(&mut self, id: ClipId, tag: &str) -> bool {
        let tag = tag.trim();
        let Some(position) = self.get(id).and_then(|c| c.tag_position(tag)) else {
            return false;
        };
        let mut action = EditAction::ToggleTag {
            clip_id: id,
            tag: tag.to_string(),
            was_added: false,
            position,
        };
        self.apply(&mut action, Direction::Forward);
        self.record(action);
        true
    }

    /// Change a clip's display name, keeping the source extension when the
    /// new name has none. Returns the name actually applied.
    pub fn rename(&mut self, id: ClipId, new_name: &str) -> Option<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return None;
        }
        let Some(clip) = self.get(id) else {
            Self::stale(id, "rename");
            return None;
        };
        let applied = preserve_extension(new_name, clip.source_path());
        if applied == clip.display_name {
            return Some(applied);
        }
        let mut action = EditAction::RenameClip {
            clip_id: id,
            old_name: clip.display_name.clone(),
            new_name: applied.clone(),
        };
        self.apply(&mut action, Direction::Forward);
        self.record(action);
        Some(applied)
    }

    /// Apply many (clip, tag) pairs as one undoable action.
    ///
    /// Pairs whose clip is unknown, whose tag is blank, or whose tag the clip
    /// already carries are left out of the recorded action, so undo never
    /// strips a tag the user added independently. Returns the number of
    /// pairs applied.
    pub fn apply_tag_batch<I, S>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (ClipId, S)>,
        S: AsRef<str>,
    {
        let mut applied: Vec<TagAssignment> = Vec::new();
        for (clip_id, tag) in pairs {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            let Some(clip) = self.get(clip_id) else {
                Self::stale(clip_id, "apply_tag_batch");
                continue;
            };
            let pending = applied.iter().any(|a| a.clip_id == clip_id && a.tag == tag);
            if clip.has_tag(tag) || pending {
                continue;
            }
            applied.push(TagAssignment {
                clip_id,
                tag: tag.to_string(),
            });
        }
        let count = applied.len();
        if count > 0 {
            let mut action = EditAction::BatchTagApply { applied };
            self.apply(&mut action, Direction::Forward);
            self.record(action);
        }
        count
    }

    // -- Undo / redo ---------------------------------------------------------

    /// Revert the most recent action. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let Some(mut action) = self.log.pop_undo() else {
            return false;
        };
        tracing::debug!(action = action.label(), "Undo");
        self.apply(&mut action, Direction::Inverse);
        self.log.push_redo(action);
        self.notify_history();
        true
    }

    /// Replay the most recently undone action. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        let Some(mut action) = self.log.pop_redo() else {
            return false;
        };
        tracing::debug!(action = action.label(), "Redo");
        self.apply(&mut action, Direction::Forward);
        self.log.push_undo(action);
        self.notify_history();
        true
    }

    /// Forget all undo/redo history.
    pub fn clear_history(&mut self) {
        self.log.clear();
        self.notify_history();
    }

    /// Apply one direction of `action` to the clip set.
    ///
    /// This is the only place edit semantics live. `AddClips` stores the
    /// snapshots it removes on undo inside the action so redo can restore
    /// them.
    pub fn apply(&mut self, action: &mut EditAction, direction: Direction) {
        use Direction::{Forward, Inverse};

        match action {
            EditAction::SetRating { clip_id, old, new } => {
                let value = match direction {
                    Forward => *new,
                    Inverse => *old,
                };
                let id = *clip_id;
                if let Some(clip) = self.get_mut(id) {
                    clip.rating = value;
                    self.notify(RegistryChange::ClipUpdated(id));
                }
            }
            EditAction::ToggleTag {
                clip_id,
                tag,
                was_added,
                position,
            } => {
                let insert = (direction == Forward) == *was_added;
                let id = *clip_id;
                let Some(clip) = self.get_mut(id) else {
                    return;
                };
                let changed = if insert {
                    if clip.has_tag(tag) {
                        false
                    } else {
                        let at = (*position).min(clip.tags.len());
                        clip.tags.insert(at, tag.clone());
                        true
                    }
                } else {
                    match clip.tag_position(tag) {
                        Some(at) => {
                            clip.tags.remove(at);
                            true
                        }
                        None => false,
                    }
                };
                if changed {
                    self.notify(RegistryChange::ClipUpdated(id));
                }
            }
            EditAction::RemoveClip { clip, index } => match direction {
                Forward => {
                    let id = clip.id();
                    if let Some(at) = self.index_of(id) {
                        self.clips.remove(at);
                        self.notify(RegistryChange::ClipsRemoved(vec![id]));
                    }
                }
                Inverse => {
                    if !self.contains(clip.id()) {
                        // Clamped: other removals may have shifted indices.
                        let at = (*index).min(self.clips.len());
                        self.clips.insert(at, clip.clone());
                        self.notify(RegistryChange::ClipsAdded(vec![clip.id()]));
                    }
                }
            },
            EditAction::AddClips { ids, undone } => match direction {
                Forward => {
                    let mut restored: Vec<ClipId> = Vec::new();
                    for clip in undone.drain(..) {
                        if !self.contains(clip.id()) {
                            restored.push(clip.id());
                            self.clips.push(clip);
                        }
                    }
                    if !restored.is_empty() {
                        self.notify(RegistryChange::ClipsAdded(restored));
                    }
                }
                Inverse => {
                    let wanted: HashSet<ClipId> = ids.iter().copied().collect();
                    let (removed, kept): (Vec<Clip>, Vec<Clip>) = std::mem::take(&mut self.clips)
                        .into_iter()
                        .partition(|c| wanted.contains(&c.id()));
                    self.clips = kept;
                    if !removed.is_empty() {
                        self.notify(RegistryChange::ClipsRemoved(
                            removed.iter().map(Clip::id).collect(),
                        ));
                    }
                    *undone = removed;
                }
            },
            EditAction::RenameClip {
                clip_id,
                old_name,
                new_name,
            } => {
                let name = match direction {
                    Forward => new_name.clone(),
                    Inverse => old_name.clone(),
                };
                let id = *clip_id;
                if let Some(clip) = self.get_mut(id) {
                    clip.display_name = name;
                    self.notify(RegistryChange::ClipUpdated(id));
                }
            }
            EditAction::BatchTagApply { applied } => {
                let mut touched: Vec<ClipId> = Vec::new();
                for assignment in applied.iter() {
                    let Some(clip) = self.get_mut(assignment.clip_id) else {
                        continue;
                    };
                    let changed = match direction {
                        Forward if !clip.has_tag(&assignment.tag) => {
                            clip.tags.push(assignment.tag.clone());
                            true
                        }
                        Forward => false,
                        Inverse => match clip.tag_position(&assignment.tag) {
                            Some(at) => {
                                clip.tags.remove(at);
                                true
                            }
                            None => false,
                        },
                    };
                    if changed && !touched.contains(&assignment.clip_id) {
                        touched.push(assignment.clip_id);
                    }
                }
                for id in touched {
                    self.notify(RegistryChange::ClipUpdated(id));
                }
            }
        }
    }

    // -- Non-undoable updates ------------------------------------------------

    /// Attach asynchronously probed media facts. Not recorded as an edit.
    pub fn attach_probe(&mut self, id: ClipId, probe: ProbeInfo) -> bool {
        let Some(clip) = self.get_mut(id) else {
            Self::stale(id, "attach_probe");
            return false;
        };
        let changed = clip.attach_probe(probe);
        if changed {
            self.notify(RegistryChange::ClipUpdated(id));
        }
        changed
    }

    /// Store an opaque collaborator value (e.g. loudness analysis) for a clip.
    pub fn set_metric(&mut self, id: ClipId, value: serde_json::Value) -> bool {
        if !self.contains(id) {
            Self::stale(id, "set_metric");
            return false;
        }
        self.metrics.insert(id, value);
        self.notify(RegistryChange::MetricUpdated(id));
        true
    }

    pub fn metric(&self, id: ClipId) -> Option<&serde_json::Value> {
        self.metrics.get(&id)
    }

    pub fn metrics(&self) -> &HashMap<ClipId, serde_json::Value> {
        &self.metrics
    }

    /// Drop clips that left the triage set through a commit.
    ///
    /// Not undoable: the files have moved. Metrics for those clips are purged.
    /// Stale undo entries that reference them become no-ops.
    pub fn remove_committed(&mut self, ids: &[ClipId]) -> Vec<Clip> {
        let wanted: HashSet<ClipId> = ids.iter().copied().collect();
        let (removed, kept): (Vec<Clip>, Vec<Clip>) = std::mem::take(&mut self.clips)
            .into_iter()
            .partition(|c| wanted.contains(&c.id()));
        self.clips = kept;
        for clip in &removed {
            self.metrics.remove(&clip.id());
        }
        if !removed.is_empty() {
            self.notify(RegistryChange::ClipsRemoved(
                removed.iter().map(Clip::id).collect(),
            ));
        }
        removed
    }

    // -- Internals -----------------------------------------------------------

    pub(crate) fn from_parts(
        clips: Vec<Clip>,
        metrics: HashMap<ClipId, serde_json::Value>,
    ) -> Self {
        Self {
            clips,
            metrics,
            ..Self::default()
        }
    }

    fn get_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id() == id)
    }

    fn record(&mut self, action: EditAction) {
        self.log.push(action);
        self.notify_history();
    }

    fn notify(&self, change: RegistryChange) {
        if let Some(observer) = &self.observer {
            observer.on_change(&change);
        }
    }

    fn notify_history(&self) {
        self.notify(RegistryChange::HistoryChanged {
            can_undo: self.log.can_undo(),
            can_redo: self.log.can_redo(),
        });
    }

    fn stale(id: ClipId, op: &str) {
        tracing::debug!(%id, op, "Ignoring stale clip id");
    }
}

impl fmt::Debug for ClipRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipRegistry")
            .field("clips", &self.clips.len())
            .field("metrics", &self.metrics.len())
            .field("undo_depth", &self.log.undo_depth())
            .field("redo_depth", &self.log.redo_depth())
            .finish()
    }
}
