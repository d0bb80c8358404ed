//! Text extraction seam.
//!
//! The core never touches files or PDF internals. Callers materialize the
//! upload's bytes and hand them to an [`Extractor`]; the app crate provides
//! the `pdf-extract` backed implementation.

use crate::error::Result;
use crate::models::ExtractedText;

pub trait Extractor: Send + Sync {
    /// Extract text and per-page pools from an upload.
    ///
    /// Fails with [`DocqError::UnsupportedFileType`](crate::error::DocqError::UnsupportedFileType)
    /// for anything other than `.pdf` / `.txt`. Blank output is not an error
    /// here; the document store rejects it.
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText>;
}
