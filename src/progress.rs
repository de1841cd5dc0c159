//! Progress-callback trait for multi-document runs.
//!
//! Inject an [`Arc<dyn PublishProgressCallback>`] via
//! [`crate::config::PublishConfigBuilder::progress_callback`] to receive an
//! event as [`crate::publish::publish_all`] moves through each document.
//! The binary uses it to drive a terminal progress bar; library callers can
//! forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use medium_publish::{PublishConfig, PublishProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl PublishProgressCallback for Counter {
//!     fn on_document_error(&self, _index: usize, _total: usize, path: &Path, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}: {}", path.display(), error);
//!     }
//! }
//!
//! let config = PublishConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PublishOutcome;
use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::publish::publish_all`] around each document.
///
/// All methods default to no-ops. `index` is 1-based.
pub trait PublishProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a document is loaded.
    fn on_document_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a document finished without error.
    fn on_document_complete(&self, index: usize, total: usize, path: &Path, outcome: &PublishOutcome) {
        let _ = (index, total, path, outcome);
    }

    /// Called when a document failed. Later documents still run.
    fn on_document_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after every document has been attempted.
    fn on_run_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PublishProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PublishConfig`].
pub type ProgressCallback = Arc<dyn PublishProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::DryRunReport;
    use std::path::PathBuf;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        let path = PathBuf::from("posts/a/index.md");
        let outcome = PublishOutcome::DryRun(DryRunReport {
            path: path.clone(),
            title: "a".into(),
            tags: vec![],
            content_chars: 0,
            rewritten_images: 0,
            token_hint: None,
        });
        cb.on_run_start(2);
        cb.on_document_start(1, 2, &path);
        cb.on_document_complete(1, 2, &path, &outcome);
        cb.on_document_error(2, 2, &path, "boom");
        cb.on_run_complete(2, 1);
    }
}
