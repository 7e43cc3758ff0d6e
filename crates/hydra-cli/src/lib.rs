//! hydra - manifest-tracked application trees
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Builds a manifest of every file under an application directory, makes a
//! destination tree match a manifest by fetching only what is missing or
//! corrupted, and folds a validated tree into a single `.tar.gz` bundle.
//!
//! # Workflow
//!
//! ```text
//! hydra generate app/ -o app/manifest.yaml       # record names, sizes, hashes
//! hydra sync -m app/manifest.yaml -s https://cdn.example.com/app -d ~/run
//! hydra bundle -m app/manifest.yaml -r app/ -o app.tar.gz
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use hydra_schema::MANIFEST_FILENAME;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hydra")]
#[command(author, version, about = "hydra - build, sync and bundle application trees")]
pub struct Cli {
    /// Log filter, e.g. `info` or `hydra_core=debug` (falls back to RUST_LOG)
    #[arg(long, global = true, env = "HYDRA_LOG")]
    pub log_level: Option<String>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show each file as it is processed
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a manifest from a directory tree
    Generate {
        /// Directory to walk
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Where to write the manifest (`-` for stdout)
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        output: String,
        /// Bundle the tree into app.tar.gz next to the output and emit a
        /// manifest tracking only the bundle
        #[arg(long)]
        bundle: bool,
    },
    /// Make a destination tree match a manifest, fetching what is missing
    Sync {
        /// Manifest to reconcile against
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
        /// Source root: a local path or an http(s)://, ftp://, sftp:// or file:// URL
        #[arg(short, long)]
        source: String,
        /// Destination directory
        #[arg(short, long, default_value = ".", env = "HYDRA_OUTPUT_DIR")]
        dest: PathBuf,
        /// Maximum concurrent retrievals
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,
    },
    /// Fold a validated tree into a single .tar.gz
    Bundle {
        /// Manifest listing the files to bundle
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
        /// Directory the manifest's entries are relative to
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Output archive
        #[arg(short, long, default_value = "app.tar.gz")]
        output: PathBuf,
    },
    /// Check a tree against a manifest without changing anything
    Verify {
        /// Manifest to check against
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
        /// Directory to check
        #[arg(short, long, default_value = ".", env = "HYDRA_OUTPUT_DIR")]
        dest: PathBuf,
        /// Print problems as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove module files from a tree
    Clean {
        /// Manifest listing the modules
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
        /// Directory to clean
        #[arg(short, long, default_value = ".", env = "HYDRA_OUTPUT_DIR")]
        dest: PathBuf,
    },
    /// Locate a bundle by name on the search path (HYDRA_PATH)
    Find {
        /// Bundle name or path
        name: String,
    },
    /// Show the contents of a manifest
    Inspect {
        /// Manifest to show
        #[arg(short, long, default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
    },
}
