//! intel-core: threat intelligence processing pipeline
//!
//! Pure, synchronous batch processing: raw feed items in, ranked and
//! annotated threat records out. Stages run in a fixed order
//! (normalize -> dedup -> correlate -> enrich -> score -> rank) and every
//! stage is deterministic for a fixed clock. The cache module provides the
//! TTL gateway the serving layer reads batches through.

pub mod cache;
pub mod correlate;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod score;
pub mod types;

pub use cache::{CacheGateway, CacheStore, MemoryStore, SqliteStore};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::Pipeline;
pub use types::{
    BatchStats, MergedThreat, NormalizedItem, RankedBatch, RawItem, RiskAssessment, Severity,
    ThreatRecord,
};
