//! paperscout-ingest — paper ingestion pipeline.
//!
//! Covers the path from external source to relational store:
//! - Source discovery (arXiv, Semantic Scholar, IEEE Xplore)
//! - Request pacing with bounded retries
//! - Normalization of source-shaped records into the canonical schema
//! - Deduplicating upsert via `paperscout-db`

pub mod models;
pub mod normalize;
pub mod pacing;
pub mod pipeline;
pub mod sources;

pub use models::{FetchConfig, RawRecord, SourceId};
pub use pipeline::{run, run_with_sources, IngestJob, RunSummary, SourceWarning};
