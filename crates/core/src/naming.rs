//! Naming rules for commit output: collision suffixes for files, numeric
//! suffixes for the commit root, and folder-name sanitizing.
//!
//! Convention:
//! - files: `clip.mov`, `clip_1.mov`, `clip_2.mov`, ...
//! - commit root: `Triaged Clips`, `Triaged Clips 1`, `Triaged Clips 2`, ...

use std::path::{Path, PathBuf};

/// Upper bound on suffix probing before giving up on a name.
pub const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

/// File name with a collision suffix inserted before the extension.
///
/// `n == 0` returns the name unchanged.
///
/// ```
/// use cliptriage_core::naming::suffixed_file_name;
///
/// assert_eq!(suffixed_file_name("clip.mov", 0), "clip.mov");
/// assert_eq!(suffixed_file_name("clip.mov", 1), "clip_1.mov");
/// assert_eq!(suffixed_file_name("archive.tar.gz", 2), "archive.tar_2.gz");
/// assert_eq!(suffixed_file_name("README", 3), "README_3");
/// ```
pub fn suffixed_file_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{stem}_{n}.{ext}"),
        _ => format!("{name}_{n}"),
    }
}

/// Commit root name with a space-separated numeric suffix. `n == 0`
/// returns the base unchanged.
pub fn suffixed_folder_name(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base} {n}")
    }
}

/// Candidate destination for attempt `n` of placing `file_name` in `dir`.
pub fn collision_candidate(dir: &Path, file_name: &str, n: u32) -> PathBuf {
    dir.join(suffixed_file_name(file_name, n))
}

/// Make a user-supplied label safe to use as a single folder name.
///
/// Path separators and `:` become `-`, control characters are dropped,
/// and surrounding whitespace is trimmed. `.` and `..` collapse to an
/// empty string so callers can fall back to another name.
pub fn sanitize_folder_name(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed == "." || trimmed == ".." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Make a display name safe to use as a single file name.
///
/// Falls back to `fallback` when nothing usable remains.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned = sanitize_folder_name(name);
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}
