//! Progress reporting seam between the library and its front ends.
//!
//! Synchronization and bundling call into a [`Reporter`]; the CLI supplies
//! a terminal implementation and everything else uses [`NullReporter`].

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Fetching", "Validating").
    fn section(&self, title: &str);

    /// A file is being retrieved from the source root.
    fn fetching(&self, name: &str, size: u64);

    /// An archive entry is being expanded into the destination tree.
    fn extracting(&self, name: &str);

    /// A file is being written into a bundle.
    fn bundling(&self, name: &str, size: u64);

    /// Marks a file operation as successfully completed.
    fn done(&self, name: &str, detail: &str, size: Option<u64>);

    /// Marks a file operation as failed with a specific reason.
    fn failed(&self, name: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn fetching(&self, name: &str, size: u64) {
        (**self).fetching(name, size);
    }
    fn extracting(&self, name: &str) {
        (**self).extracting(name);
    }
    fn bundling(&self, name: &str, size: u64) {
        (**self).bundling(name, size);
    }
    fn done(&self, name: &str, detail: &str, size: Option<u64>) {
        (**self).done(name, detail, size);
    }
    fn failed(&self, name: &str, reason: &str) {
        (**self).failed(name, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn fetching(&self, _: &str, _: u64) {}
    fn extracting(&self, _: &str) {}
    fn bundling(&self, _: &str, _: u64) {}
    fn done(&self, _: &str, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
