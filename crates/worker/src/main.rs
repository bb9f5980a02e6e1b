use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cliptriage_pipeline::{CommitConfig, TokioFs};
use cliptriage_worker::cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cliptriage_worker=info,cliptriage_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let fs = Arc::new(TokioFs);

    match args.command {
        Command::Commit(commit) => {
            let config = commit.apply_to(CommitConfig::from_env());
            let result = cliptriage_worker::run_commit(fs, config, &commit.session).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Inspect { root } => {
            let report = cliptriage_worker::run_inspect(fs, &root).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
