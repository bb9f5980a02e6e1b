//! Summary metadata for a committed set: a JSON document and a flat CSV.
//!
//! Built only from entries that reached `verified`. Purely in-memory; the
//! pipeline writes the rendered strings into the commit root.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::destination::{folder_for, rating_folder, secondary_tag_note, OrganizationMode};
use crate::types::Timestamp;

/// JSON summary file name inside the commit root.
pub const SUMMARY_JSON_FILE_NAME: &str = "triage_metadata.json";

/// CSV summary file name inside the commit root.
pub const SUMMARY_CSV_FILE_NAME: &str = "triage_summary.csv";

/// CSV header row.
pub const CSV_HEADER: &str =
    "Filename,Rating,Tags,Duration,Resolution,Folder,Rating Folder,Original Path";

/// Separator between tags inside the CSV `Tags` column.
pub const CSV_TAG_SEPARATOR: &str = "; ";

/// A clip that was moved and verified, with where it landed.
#[derive(Debug, Clone)]
pub struct CommittedClip {
    pub clip: Clip,
    pub folder: String,
    pub destination: PathBuf,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Per-clip record in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryClip {
    pub filename: String,
    pub rating: u8,
    /// Sorted alphabetically.
    pub tags: Vec<String>,
    /// Seconds, rounded to one decimal; `0` when unknown.
    pub duration: f64,
    pub original_path: String,
    pub folder: String,
    pub rating_folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_folder: Option<String>,
    /// `"also: ..."` note for secondary tags in by-tag mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl SummaryClip {
    fn from_committed(committed: &CommittedClip, mode: OrganizationMode) -> Self {
        let clip = &committed.clip;
        let filename = committed
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| clip.display_name.clone());
        let mut tags = clip.tags.clone();
        tags.sort();
        Self {
            filename,
            rating: clip.rating.value(),
            tags,
            duration: round_duration(clip.duration_secs.unwrap_or(0.0)),
            original_path: clip.source_path().display().to_string(),
            folder: committed.folder.clone(),
            rating_folder: rating_folder(clip.rating),
            primary_tag: clip.primary_tag().map(str::to_string),
            tag_folder: clip
                .primary_tag()
                .map(|_| folder_for(clip, OrganizationMode::ByTag)),
            folder_note: secondary_tag_note(clip, mode),
            resolution: clip.resolution.map(|r| r.to_string()),
            file_size: clip.file_size,
        }
    }
}

/// The JSON summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub export_date: Timestamp,
    pub app_version: String,
    pub total_clips: usize,
    pub skipped_untouched: usize,
    pub organization: OrganizationMode,
    /// Rated clips per rating folder. Unrated clips are not counted.
    pub rating_summary: BTreeMap<String, usize>,
    /// Occurrences of every tag across the committed clips.
    pub tag_summary: BTreeMap<String, usize>,
    pub clips: Vec<SummaryClip>,
}

impl Summary {
    pub fn build(
        committed: &[CommittedClip],
        organization: OrganizationMode,
        skipped_untouched: usize,
        export_date: Timestamp,
        app_version: impl Into<String>,
    ) -> Self {
        let mut rating_summary: BTreeMap<String, usize> = BTreeMap::new();
        let mut tag_summary: BTreeMap<String, usize> = BTreeMap::new();
        for item in committed {
            if !item.clip.rating.is_unrated() {
                *rating_summary.entry(rating_folder(item.clip.rating)).or_default() += 1;
            }
            for tag in &item.clip.tags {
                *tag_summary.entry(tag.clone()).or_default() += 1;
            }
        }

        Self {
            export_date,
            app_version: app_version.into(),
            total_clips: committed.len(),
            skipped_untouched,
            organization,
            rating_summary,
            tag_summary,
            clips: committed
                .iter()
                .map(|c| SummaryClip::from_committed(c, organization))
                .collect(),
        }
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Flat CSV mirroring the per-clip records, header first.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for clip in &self.clips {
            let row = [
                csv_escape(&clip.filename),
                clip.rating.to_string(),
                csv_escape(&clip.tags.join(CSV_TAG_SEPARATOR)),
                format_duration(clip.duration),
                csv_escape(clip.resolution.as_deref().unwrap_or("")),
                csv_escape(&clip.folder),
                csv_escape(&clip.rating_folder),
                csv_escape(&clip.original_path),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape a value for CSV: wrap in quotes if it contains a delimiter, quote,
/// or line break, doubling embedded quotes.
pub fn csv_escape(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn round_duration(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 10.0).round() / 10.0
    } else {
        0.0
    }
}

fn format_duration(secs: f64) -> String {
    format!("{secs:.1}")
}
