//! Core library for hydra.
//!
//! - [`builder`] walks a source tree into a [`Manifest`](hydra_schema::Manifest).
//! - [`sync`] reconciles a destination tree against a manifest, fetching
//!   through the scheme-keyed [`io::fetch`] backends.
//! - [`bundle`] folds a validated tree into a single `.tar.gz`.

pub mod builder;
pub mod bundle;
pub mod config;
pub mod hashing;
pub mod io;
pub mod module;
pub mod paths;
pub mod reporter;
pub mod sync;
pub mod validate;

pub use builder::Builder;
pub use bundle::{BundleError, BundleSummary, bundle};
pub use config::FetchConfig;
pub use io::fetch::{Retriever, RetrieverRegistry};
pub use reporter::{NullReporter, Reporter};
pub use sync::{SyncOptions, SyncReport, Synchronizer};

/// User Agent string for remote retrieval
pub const USER_AGENT: &str = concat!("hydra-core/", env!("CARGO_PKG_VERSION"));
