//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as [`crate::extract::extract_documents`] works through a batch.
//!
//! # Example
//!
//! ```rust
//! use invoice_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     tables: Arc<AtomicUsize>,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, source: &str, tables: usize, _items: usize) {
//!         self.tables.fetch_add(tables, Ordering::SeqCst);
//!         eprintln!("{source}: {tables} tables");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     tables: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Documents run concurrently, so the per-document methods may be called
/// from several tasks at once. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document's analysis file is loaded.
    ///
    /// * `index`  — 0-based position in the batch
    /// * `source` — file name
    fn on_document_start(&self, index: usize, source: &str) {
        let _ = (index, source);
    }

    /// Called when a document finished, even if some of its tables failed.
    fn on_document_complete(&self, index: usize, source: &str, tables: usize, line_items: usize) {
        let _ = (index, source, tables, line_items);
    }

    /// Called when a document could not be processed at all.
    fn on_document_error(&self, index: usize, source: &str, error: &str) {
        let _ = (index, source, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
