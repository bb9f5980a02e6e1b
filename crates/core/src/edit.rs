//! Reversible edit actions recorded on the edit log.
//!
//! Every variant carries exactly what is needed to replay it forward and
//! to invert it. The registry applies both directions through a single
//! exhaustive match (see [`crate::registry::ClipRegistry`]), so adding a
//! variant here is a compile error until its inversion is written.

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, Rating};
use crate::types::ClipId;

/// Which effect of an action to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Replay the original mutation (redo).
    Forward,
    /// Undo the original mutation.
    Inverse,
}

/// A single (clip, tag) assignment applied by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssignment {
    pub clip_id: ClipId,
    pub tag: String,
}

/// A reversible mutation of the clip registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditAction {
    SetRating {
        clip_id: ClipId,
        old: Rating,
        new: Rating,
    },
    ToggleTag {
        clip_id: ClipId,
        tag: String,
        /// `true` when the toggle added the tag, `false` when it removed it.
        was_added: bool,
        /// Index the tag occupied (when removed) or was appended at (when
        /// added), so the inverse restores tag order exactly.
        position: usize,
    },
    RemoveClip {
        clip: Clip,
        index: usize,
    },
    AddClips {
        ids: Vec<ClipId>,
        /// Snapshots taken when the add is undone, replayed on redo.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        undone: Vec<Clip>,
    },
    RenameClip {
        clip_id: ClipId,
        old_name: String,
        new_name: String,
    },
    BatchTagApply {
        /// Only the pairs that actually changed a clip. Tags already present
        /// before the batch are excluded.
        applied: Vec<TagAssignment>,
    },
}

impl EditAction {
    /// Short label for logs and menu items ("Undo Set Rating").
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetRating { .. } => "Set Rating",
            Self::ToggleTag { .. } => "Toggle Tag",
            Self::RemoveClip { .. } => "Remove Clip",
            Self::AddClips { .. } => "Add Clips",
            Self::RenameClip { .. } => "Rename Clip",
            Self::BatchTagApply { .. } => "Apply Tags",
        }
    }

    /// Ids of every clip the action touches.
    pub fn clip_ids(&self) -> Vec<ClipId> {
        match self {
            Self::SetRating { clip_id, .. }
            | Self::ToggleTag { clip_id, .. }
            | Self::RenameClip { clip_id, .. } => vec![*clip_id],
            Self::RemoveClip { clip, .. } => vec![clip.id()],
            Self::AddClips { ids, .. } => ids.clone(),
            Self::BatchTagApply { applied } => {
                let mut ids: Vec<ClipId> = Vec::new();
                for a in applied {
                    if !ids.contains(&a.clip_id) {
                        ids.push(a.clip_id);
                    }
                }
                ids
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let id = crate::types::new_clip_id();
        let actions = [
            EditAction::SetRating {
                clip_id: id,
                old: Rating::UNRATED,
                new: Rating::UNRATED,
            },
            EditAction::ToggleTag {
                clip_id: id,
                tag: "x".into(),
                was_added: true,
                position: 0,
            },
            EditAction::RemoveClip {
                clip: Clip::new("a.mov"),
                index: 0,
            },
            EditAction::AddClips {
                ids: vec![id],
                undone: vec![],
            },
            EditAction::RenameClip {
                clip_id: id,
                old_name: "a".into(),
                new_name: "b".into(),
            },
            EditAction::BatchTagApply { applied: vec![] },
        ];
        let mut labels: Vec<_> = actions.iter().map(EditAction::label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), actions.len());
    }

    #[test]
    fn batch_clip_ids_are_deduplicated_in_order() {
        let a = crate::types::new_clip_id();
        let b = crate::types::new_clip_id();
        let action = EditAction::BatchTagApply {
            applied: vec![
                TagAssignment { clip_id: a, tag: "x".into() },
                TagAssignment { clip_id: b, tag: "x".into() },
                TagAssignment { clip_id: a, tag: "y".into() },
            ],
        };
        assert_eq!(action.clip_ids(), vec![a, b]);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let action = EditAction::RenameClip {
            clip_id: crate::types::new_clip_id(),
            old_name: "a.mov".into(),
            new_name: "b.mov".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["kind"], "rename_clip");
        assert_eq!(json["new_name"], "b.mov");
    }
}
