//! Error taxonomy for the pipeline and cache gateway

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure classes for ingestion, caching and profile loading.
///
/// None of these abort a batch: a `Fetch` failure drops one feed's items, a
/// `Parse` failure skips one item, a `Validation` failure degrades one
/// enricher to an empty match set, and a `CacheRead` failure falls back to
/// the last successfully cached value where one exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One feed failed; its items are simply absent from the batch.
    #[error("feed '{feed}' failed: {reason}")]
    Fetch { feed: String, reason: String },

    /// A malformed raw item or payload; skipped, not fatal.
    #[error("parse error: {0}")]
    Parse(String),

    /// The backing cache store could not be read and no fallback exists.
    #[error("cache read failed: {0}")]
    CacheRead(String),

    /// The backing cache store rejected a write.
    #[error("cache write failed: {0}")]
    CacheWrite(String),

    /// Malformed reference-profile data.
    #[error("invalid profile data: {0}")]
    Validation(String),
}
