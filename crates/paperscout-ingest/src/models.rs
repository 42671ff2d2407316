//! Data models for the ingestion pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed set of supported paper sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Arxiv,
    SemanticScholar,
    Ieee,
}

impl SourceId {
    /// Display name, used as the `source` column in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Arxiv           => "arXiv",
            SourceId::SemanticScholar => "Semantic Scholar",
            SourceId::Ieee            => "IEEE Xplore",
        }
    }

    pub const ALL: [SourceId; 3] = [SourceId::Arxiv, SourceId::SemanticScholar, SourceId::Ieee];
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arxiv"                        => Ok(SourceId::Arxiv),
            "semanticscholar" | "s2"       => Ok(SourceId::SemanticScholar),
            "ieee" | "ieeexplore"          => Ok(SourceId::Ieee),
            other => Err(format!("unknown source '{other}' (expected arxiv, semanticscholar or ieee)")),
        }
    }
}

/// A source-shaped, unnormalized search result.
///
/// Field names follow the originating source's own vocabulary (`summary` on
/// arXiv, `articleTitle` on IEEE, …); only `normalize` knows the mapping to
/// the canonical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub source: SourceId,
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(source: SourceId) -> Self {
        Self { source, fields: Map::new() }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }
}

/// Retrieval settings shared by all source adapters.
///
/// Threaded in explicitly from configuration; each adapter composes its own
/// pacer from the delay fields, so adapters never share pacing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Lower bound of the randomized inter-request delay, seconds.
    pub delay_min: f64,
    /// Upper bound of the randomized inter-request delay, seconds.
    pub delay_max: f64,
    /// Retry ceiling per network call.
    pub max_retries: u32,
    /// Per-request timeout, seconds.
    pub timeout: u64,
    /// Whether adapters that can fetch PDFs should do so.
    pub download_pdf: bool,
    /// Cap on returned records, per source.
    pub max_results: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_min: 2.0,
            delay_max: 5.0,
            max_retries: 3,
            timeout: 30,
            download_pdf: true,
            max_results: 50,
        }
    }
}
