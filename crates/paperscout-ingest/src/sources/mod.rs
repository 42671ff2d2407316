//! Paper source clients.

pub mod arxiv;
pub mod ieee;
pub mod semanticscholar;

use async_trait::async_trait;

use crate::models::{RawRecord, SourceId};

/// Common interface for all paper source clients.
///
/// Implementations pace their own requests, retry transient failures up to
/// the configured ceiling and cap results at `max_results`. A single
/// malformed result is skipped with a warning; a search-level failure
/// surfaces as an error that the pipeline downgrades to zero results.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Which source this client talks to.
    fn source(&self) -> SourceId;

    /// Search for papers matching a title, returns source-shaped records.
    async fn search_by_title(&self, title: &str) -> anyhow::Result<Vec<RawRecord>>;
}
