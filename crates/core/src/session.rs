//! Persistable snapshot of a triage session.
//!
//! Saves the clip list and collaborator metrics. Undo history is not
//! persisted; a restored registry starts with an empty edit log.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::error::CoreError;
use crate::registry::ClipRegistry;
use crate::types::ClipId;

/// Current session format version.
pub const SESSION_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageSession {
    pub version: u16,
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub metrics: HashMap<ClipId, serde_json::Value>,
}

impl TriageSession {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let session: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid session file: {e}")))?;
        if session.version > SESSION_FORMAT_VERSION {
            return Err(CoreError::Validation(format!(
                "Session format version {} is newer than supported {SESSION_FORMAT_VERSION}",
                session.version
            )));
        }
        Ok(session)
    }

    pub fn to_pretty_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize session: {e}")))
    }
}

impl ClipRegistry {
    pub fn to_session(&self) -> TriageSession {
        TriageSession {
            version: SESSION_FORMAT_VERSION,
            clips: self.clips().to_vec(),
            metrics: self.metrics().clone(),
        }
    }

    /// Rebuild a registry from a saved session.
    ///
    /// Duplicate clip ids keep their first occurrence; metrics for unknown
    /// clips are dropped.
    pub fn from_session(session: TriageSession) -> Self {
        let mut clips: Vec<Clip> = Vec::with_capacity(session.clips.len());
        for clip in session.clips {
            if clips.iter().any(|c| c.id() == clip.id()) {
                tracing::warn!(id = %clip.id(), "Dropping duplicate clip id in session");
                continue;
            }
            clips.push(clip);
        }
        let metrics = session
            .metrics
            .into_iter()
            .filter(|(id, _)| clips.iter().any(|c| c.id() == *id))
            .collect();
        Self::from_parts(clips, metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Rating;

    #[test]
    fn session_round_trip_restores_clips_without_history() {
        let mut registry = ClipRegistry::new();
        let ids = registry.add_clips(vec![
            Clip::new("/in/a.mov").with_tags(["Dunk"]),
            Clip::new("/in/b.mov"),
        ]);
        registry.set_rating(ids[1], Rating::new(4).unwrap());
        registry.set_metric(ids[0], serde_json::json!({"lufs": -16.0}));

        let json = registry.to_session().to_pretty_json().unwrap();
        let restored = ClipRegistry::from_session(TriageSession::from_json(&json).unwrap());

        assert_eq!(restored.clips(), registry.clips());
        assert_eq!(restored.metric(ids[0]), registry.metric(ids[0]));
        assert!(!restored.can_undo());
    }

    #[test]
    fn rejects_newer_versions() {
        let json = r#"{"version": 99, "clips": []}"#;
        let err = TriageSession::from_json(json).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn drops_orphan_metrics() {
        let clip = Clip::new("/in/a.mov");
        let ghost = crate::types::new_clip_id();
        let session = TriageSession {
            version: SESSION_FORMAT_VERSION,
            clips: vec![clip.clone()],
            metrics: HashMap::from([
                (clip.id(), serde_json::json!(1)),
                (ghost, serde_json::json!(2)),
            ]),
        };
        let registry = ClipRegistry::from_session(session);
        assert_eq!(registry.metrics().len(), 1);
    }
}
