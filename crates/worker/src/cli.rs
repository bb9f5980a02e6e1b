use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cliptriage_core::OrganizationMode;
use cliptriage_pipeline::CommitConfig;

/// Command-line arguments for cliptriage-worker.
#[derive(Parser, Debug)]
#[command(name = "cliptriage-worker")]
#[command(about = "Commit triaged clips into organized folders")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move the clips of a saved session into the output folder.
    Commit(CommitArgs),
    /// Compare a commit manifest with what is on disk.
    Inspect {
        /// Commit root containing `_commit_manifest.json`.
        root: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct CommitArgs {
    /// Session file to commit. Rewritten with the clips that remain.
    #[arg(short, long, env = "CLIPTRIAGE_SESSION")]
    pub session: PathBuf,

    /// Overrides `CLIPTRIAGE_OUTPUT_DIR`.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Overrides `CLIPTRIAGE_ROOT_NAME`.
    #[arg(long)]
    pub root_name: Option<String>,

    /// `by-rating` or `by-tag`. Overrides `CLIPTRIAGE_ORGANIZATION`.
    #[arg(long, value_parser = parse_organization)]
    pub organization: Option<OrganizationMode>,

    /// Move clips with no rating and no tags into `Unrated` too.
    #[arg(long)]
    pub include_untouched: bool,
}

impl CommitArgs {
    /// Apply command-line overrides on top of `base`.
    pub fn apply_to(&self, mut base: CommitConfig) -> CommitConfig {
        if let Some(dir) = &self.output_dir {
            base.output_dir = dir.clone();
        }
        if let Some(name) = &self.root_name {
            base.root_name = name.clone();
        }
        if let Some(mode) = self.organization {
            base.options.organization = mode;
        }
        if self.include_untouched {
            base.options.skip_untouched = false;
        }
        base
    }
}

fn parse_organization(raw: &str) -> Result<OrganizationMode, String> {
    OrganizationMode::from_name(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_what_was_given() {
        let args = Args::parse_from([
            "cliptriage-worker",
            "commit",
            "--session",
            "s.json",
            "--organization",
            "tag",
        ]);
        let Command::Commit(commit) = args.command else {
            panic!("expected commit");
        };
        let config = commit.apply_to(CommitConfig::default());
        assert_eq!(config.options.organization, OrganizationMode::ByTag);
        assert!(config.options.skip_untouched);
        assert_eq!(config.root_name, CommitConfig::default().root_name);
    }

    #[test]
    fn rejects_unknown_organization() {
        let parsed = Args::try_parse_from([
            "cliptriage-worker",
            "commit",
            "--session",
            "s.json",
            "--organization",
            "by-color",
        ]);
        assert!(parsed.is_err());
    }
}
