use std::path::PathBuf;

use cliptriage_core::{CommitOptions, OrganizationMode};

/// Default name of the folder created under the output directory.
pub const DEFAULT_ROOT_NAME: &str = "Triaged Clips";

/// Commit configuration loaded from environment variables.
///
/// All fields have defaults so a bare environment produces a usable config.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitConfig {
    /// Directory the commit root is created in (default: current directory).
    pub output_dir: PathBuf,
    /// Base name of the commit root folder (default: `Triaged Clips`).
    pub root_name: String,
    pub options: CommitOptions,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            options: CommitOptions::default(),
        }
    }
}

impl CommitConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default          |
    /// |-----------------------------|------------------|
    /// | `CLIPTRIAGE_OUTPUT_DIR`     | `.`              |
    /// | `CLIPTRIAGE_ROOT_NAME`      | `Triaged Clips`  |
    /// | `CLIPTRIAGE_ORGANIZATION`   | `by-rating`      |
    /// | `CLIPTRIAGE_SKIP_UNTOUCHED` | `true`           |
    ///
    /// Unparseable values are logged and replaced by their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let output_dir = lookup("CLIPTRIAGE_OUTPUT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let root_name = lookup("CLIPTRIAGE_ROOT_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.root_name);

        let organization = match lookup("CLIPTRIAGE_ORGANIZATION") {
            Some(raw) => OrganizationMode::from_name(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring CLIPTRIAGE_ORGANIZATION");
                defaults.options.organization
            }),
            None => defaults.options.organization,
        };

        let skip_untouched = match lookup("CLIPTRIAGE_SKIP_UNTOUCHED") {
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "CLIPTRIAGE_SKIP_UNTOUCHED must be a boolean");
                defaults.options.skip_untouched
            }),
            None => defaults.options.skip_untouched,
        };

        Self {
            output_dir,
            root_name,
            options: CommitOptions {
                organization,
                skip_untouched,
            },
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
