//! Clip records and their triage attributes.
//!
//! A [`Clip`] is the unit the user triages: it carries an immutable
//! identity and source location, media facts resolved once by external
//! probes, and the mutable rating / tag / display-name attributes that
//! every edit operates on.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_clip_id, ClipId};

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// Highest star rating a clip can carry.
pub const MAX_RATING: u8 = 5;

/// Star rating in `0..=5`, where `0` means unrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// The unrated value.
    pub const UNRATED: Rating = Rating(0);

    /// Validate and wrap a raw star count.
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if value <= MAX_RATING {
            Ok(Self(value))
        } else {
            Err(CoreError::Validation(format!(
                "Rating {value} is out of range. Must be between 0 and {MAX_RATING}"
            )))
        }
    }

    /// Raw star count.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns `true` for the unrated value.
    pub fn is_unrated(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Media facts
// ---------------------------------------------------------------------------

/// Pixel dimensions of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Facts produced by an external media probe, attached once available.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeInfo {
    pub duration_secs: Option<f64>,
    pub resolution: Option<Resolution>,
    pub file_size: Option<u64>,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A single video clip under triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    id: ClipId,
    source_path: PathBuf,
    /// Name the file receives when committed. Independent of the source
    /// path's base name once the user renames the clip.
    pub display_name: String,
    pub duration_secs: Option<f64>,
    pub resolution: Option<Resolution>,
    pub file_size: Option<u64>,
    pub rating: Rating,
    /// Ordered, duplicate-free. The first tag is the primary tag.
    pub tags: Vec<String>,
}

impl Clip {
    /// Create an unrated, untagged clip for a newly discovered source file.
    ///
    /// The display name starts as the source's file name.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let display_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: new_clip_id(),
            source_path,
            display_name,
            duration_secs: None,
            resolution: None,
            file_size: None,
            rating: Rating::UNRATED,
            tags: Vec::new(),
        }
    }

    /// Builder: set the rating.
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    /// Builder: append tags, skipping blanks and duplicates.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            let tag = tag.trim();
            if !tag.is_empty() && !self.has_tag(tag) {
                self.tags.push(tag.to_string());
            }
        }
        self
    }

    /// Builder: set the known byte size.
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// Builder: set the known duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Builder: set the known pixel dimensions.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some(Resolution { width, height });
        self
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The first tag, which decides folder placement in by-tag mode.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Position of `tag` in the ordered tag list.
    pub fn tag_position(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    /// A clip nobody has rated or tagged.
    pub fn is_untouched(&self) -> bool {
        self.rating.is_unrated() && self.tags.is_empty()
    }

    /// Fill in probe facts that are still unknown. Known facts never change.
    pub fn attach_probe(&mut self, probe: ProbeInfo) -> bool {
        let mut changed = false;
        if self.duration_secs.is_none() && probe.duration_secs.is_some() {
            self.duration_secs = probe.duration_secs;
            changed = true;
        }
        if self.resolution.is_none() && probe.resolution.is_some() {
            self.resolution = probe.resolution;
            changed = true;
        }
        if self.file_size.is_none() && probe.file_size.is_some() {
            self.file_size = probe.file_size;
            changed = true;
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Name helpers
// ---------------------------------------------------------------------------

/// Extension of a file name, without the dot. Leading-dot names such as
/// `.hidden` have no extension.
pub fn file_extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

/// Apply `original`'s extension to `requested` when the caller left it off.
///
/// `"Best Dunk"` renamed from `clip.mov` becomes `"Best Dunk.mov"`, while
/// `"Best Dunk.mp4"` is kept as given.
pub fn preserve_extension(requested: &str, original: &Path) -> String {
    if file_extension(requested).is_some() {
        return requested.to_string();
    }
    match original.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{requested}.{ext}"),
        _ => requested.to_string(),
    }
}
