//! Scheme-dispatched retrieval backends.
//!
//! A source root is either a local path or a URI whose scheme selects the
//! [`Retriever`] registered for it. New schemes are supported by
//! registering another implementation, never by branching in the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::config::FetchConfig;

pub mod http;
pub mod local;
pub mod remote;

pub use http::HttpRetriever;
pub use local::LocalRetriever;
pub use remote::FtpRetriever;
#[cfg(unix)]
pub use remote::SftpRetriever;

/// Scheme assigned to roots that carry no `scheme://` prefix.
pub const LOCAL_SCHEME: &str = "local";

/// A readable byte stream produced by a [`Retriever`].
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("invalid source root '{root}': {reason}")]
    InvalidRoot { root: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error for {location}: {reason}")]
    Transport { location: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote storage error: {0}")]
    Remote(#[from] opendal::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the bytes of one file from a named root.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Open `name` (a `/`-separated relative path) beneath `root`.
    async fn open(&self, root: &str, name: &str) -> Result<ByteStream, FetchError>;
}

/// Registry of retrieval backends keyed on URI scheme.
#[derive(Clone, Default)]
pub struct RetrieverRegistry {
    backends: HashMap<String, Arc<dyn Retriever>>,
}

impl fmt::Debug for RetrieverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("RetrieverRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

impl RetrieverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in backend: local paths, `file`, `http`,
    /// `https`, `ftp` and (on unix) `sftp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_defaults(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut registry = Self::new();

        let local = Arc::new(LocalRetriever);
        registry.register_arc(LOCAL_SCHEME, local.clone());
        registry.register_arc("file", local);

        let http = Arc::new(HttpRetriever::new(config)?);
        registry.register_arc("http", http.clone());
        registry.register_arc("https", http);

        registry.register("ftp", FtpRetriever::new(config));
        #[cfg(unix)]
        registry.register("sftp", SftpRetriever::new(config));

        Ok(registry)
    }

    /// Register (or replace) the backend for `scheme`.
    pub fn register(&mut self, scheme: &str, retriever: impl Retriever + 'static) {
        self.register_arc(scheme, Arc::new(retriever));
    }

    /// Register a shared backend for `scheme`.
    pub fn register_arc(&mut self, scheme: &str, retriever: Arc<dyn Retriever>) {
        self.backends.insert(scheme.to_ascii_lowercase(), retriever);
    }

    /// Whether a backend is registered for `scheme`.
    pub fn supports(&self, scheme: &str) -> bool {
        self.backends.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Select the backend responsible for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnsupportedScheme`] if nothing is registered
    /// for the root's scheme.
    pub fn resolve(&self, root: &str) -> Result<&dyn Retriever, FetchError> {
        let scheme = scheme_of(root).to_ascii_lowercase();
        self.backends
            .get(&scheme)
            .map(|r| &**r)
            .ok_or(FetchError::UnsupportedScheme(scheme))
    }

    /// Open `name` beneath `root` using the backend for the root's scheme.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or [`FetchError::UnsupportedScheme`].
    pub async fn open(&self, root: &str, name: &str) -> Result<ByteStream, FetchError> {
        self.resolve(root)?.open(root, name).await
    }
}

/// The scheme of a source root, or [`LOCAL_SCHEME`] for plain paths.
///
/// Single-letter schemes are treated as Windows drive letters.
pub fn scheme_of(root: &str) -> &str {
    match root.split_once("://") {
        Some((scheme, _)) if scheme.len() > 1 && is_scheme(scheme) => scheme,
        _ => LOCAL_SCHEME,
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join a URL-style root and a relative name with exactly one `/`.
pub fn join_url(root: &str, name: &str) -> String {
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}
