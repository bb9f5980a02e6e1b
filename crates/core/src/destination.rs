//! Destination policy: which folder a clip lands in for a given
//! organization mode.
//!
//! Pure functions only. The orchestrator calls [`folder_for`] once per clip
//! per commit, both to collect the set of folders to create and to place
//! each file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, Rating};
use crate::error::CoreError;
use crate::manifest::MANIFEST_FILE_NAME;
use crate::naming::sanitize_folder_name;
use crate::summary::{SUMMARY_CSV_FILE_NAME, SUMMARY_JSON_FILE_NAME};

/// Folder name for clips without a rating.
pub const UNRATED_FOLDER: &str = "Unrated";

/// How committed clips are grouped into folders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationMode {
    /// `"<N>-star"` folders, `"Unrated"` for rating 0.
    #[default]
    ByRating,
    /// Primary tag folders, falling back to the rating folder for untagged clips.
    ByTag,
}

impl OrganizationMode {
    /// Parse the wire / config name (`"by-rating"`, `"by-tag"`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "by-rating" | "rating" => Ok(Self::ByRating),
            "by-tag" | "tag" | "tags" => Ok(Self::ByTag),
            other => Err(CoreError::Validation(format!(
                "Unknown organization mode '{other}'. Must be one of: by-rating, by-tag"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ByRating => "by-rating",
            Self::ByTag => "by-tag",
        }
    }
}

impl fmt::Display for OrganizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Folder for a rating: `"<N>-star"`, or `"Unrated"` for 0.
pub fn rating_folder(rating: Rating) -> String {
    if rating.is_unrated() {
        UNRATED_FOLDER.to_string()
    } else {
        format!("{}-star", rating.value())
    }
}

/// Files the commit writes into its root.
const ROOT_FILE_NAMES: &[&str] = &[
    MANIFEST_FILE_NAME,
    SUMMARY_JSON_FILE_NAME,
    SUMMARY_CSV_FILE_NAME,
];

/// Whether `name` collides with a file the commit keeps in its root,
/// including the `.tmp` sibling used while writing it.
pub fn is_reserved_folder_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let base = lower.strip_suffix(".tmp").unwrap_or(&lower);
    ROOT_FILE_NAMES.contains(&base)
}

/// Folder a clip is placed in under `mode`.
///
/// Tags that sanitize to nothing or to a reserved root file name fall back
/// to the rating folder.
pub fn folder_for(clip: &Clip, mode: OrganizationMode) -> String {
    if mode == OrganizationMode::ByTag {
        if let Some(tag) = clip.primary_tag() {
            let name = sanitize_folder_name(tag);
            if !name.is_empty() && !is_reserved_folder_name(&name) {
                return name;
            }
        }
    }
    rating_folder(clip.rating)
}

/// Annotation for tags beyond the primary one in by-tag mode, e.g.
/// `"also: Defense, Block"`. Secondary tags never produce extra copies.
pub fn secondary_tag_note(clip: &Clip, mode: OrganizationMode) -> Option<String> {
    if mode != OrganizationMode::ByTag || clip.tags.len() < 2 {
        return None;
    }
    Some(format!("also: {}", clip.tags[1..].join(", ")))
}
