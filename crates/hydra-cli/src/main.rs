//! hydra - build, sync and bundle application trees

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hydra_cli::cmd;
use hydra_cli::ui::Output;
use hydra_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for manifests and JSON.
    let filter = match cli.log_level.as_deref() {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log filter {level:?}"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Generate {
            dir,
            output: target,
            bundle,
        } => cmd::generate::generate(&dir, &target, bundle, &output),
        Commands::Sync {
            manifest,
            source,
            dest,
            jobs,
        } => cmd::sync::sync(&manifest, &source, &dest, jobs, &output).await,
        Commands::Bundle {
            manifest,
            root,
            output: archive,
        } => cmd::bundle::bundle(&manifest, &root, &archive, &output),
        Commands::Verify {
            manifest,
            dest,
            json,
        } => cmd::verify::verify(&manifest, &dest, json, &output),
        Commands::Clean { manifest, dest } => cmd::clean::clean(&manifest, &dest, &output),
        Commands::Find { name } => cmd::find::find(&name),
        Commands::Inspect { manifest } => cmd::inspect::inspect(&manifest),
    }
}
