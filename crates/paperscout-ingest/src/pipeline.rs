//! End-to-end ingestion pipeline.
//!
//! Orchestrates one run: for each configured source, fetch raw records,
//! normalize each, upsert each into the store. Sources are fetched on
//! independent tasks since they share no adapter state; the store serializes
//! writers through per-call transactions. The run always completes — source
//! and record failures are reduced to warnings in the summary, never
//! propagated.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use paperscout_db::PaperStore;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{FetchConfig, RawRecord, SourceId};
use crate::normalize::normalize;
use crate::sources::arxiv::ArxivClient;
use crate::sources::ieee::IeeeClient;
use crate::sources::semanticscholar::SemanticScholarClient;
use crate::sources::PaperSource;

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestJob {
    /// Title to search for.
    pub title: String,
    /// Which sources to query, in reporting order.
    pub sources: Vec<SourceId>,
    pub fetch: FetchConfig,
    /// Where the arXiv adapter drops PDFs.
    pub pdf_dir: PathBuf,
    /// Optional key for the Semantic Scholar API (raises rate limits).
    pub semanticscholar_api_key: Option<String>,
}

impl IngestJob {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sources: SourceId::ALL.to_vec(),
            fetch: FetchConfig::default(),
            pdf_dir: PathBuf::from("output/pdfs"),
            semanticscholar_api_key: None,
        }
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

/// A recoverable per-source or per-record failure.
#[derive(Debug, Clone, Serialize)]
pub struct SourceWarning {
    pub source: String,
    pub message: String,
}

/// Outcome of a run. There is no failure variant: a run always completes and
/// reports counts, with partial failures recorded in `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Papers successfully persisted across all sources.
    pub papers_found: usize,
    /// Persisted count per source display name.
    pub per_source: BTreeMap<String, usize>,
    pub errors: Vec<SourceWarning>,
    pub duration_ms: u64,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

fn build_sources(job: &IngestJob) -> Vec<Box<dyn PaperSource>> {
    job.sources
        .iter()
        .map(|id| -> Box<dyn PaperSource> {
            match id {
                SourceId::Arxiv => Box::new(ArxivClient::new(job.fetch.clone(), &job.pdf_dir)),
                SourceId::SemanticScholar => Box::new(SemanticScholarClient::new(
                    job.fetch.clone(),
                    job.semanticscholar_api_key.clone(),
                )),
                SourceId::Ieee => Box::new(IeeeClient::new(job.fetch.clone())),
            }
        })
        .collect()
}

/// Run the pipeline with the job's real source clients.
pub async fn run(job: &IngestJob, papers: &PaperStore) -> RunSummary {
    run_with_sources(&job.title, build_sources(job), papers).await
}

/// Run the pipeline over an explicit set of source clients.
pub async fn run_with_sources(
    title: &str,
    sources: Vec<Box<dyn PaperSource>>,
    papers: &PaperStore,
) -> RunSummary {
    let t0 = Instant::now();
    let mut summary = RunSummary::default();

    info!(title, sources = sources.len(), "starting ingestion run");

    // One worker per source; a hung source delays only its own contribution.
    let mut workers = JoinSet::new();
    for source in sources {
        let title = title.to_string();
        workers.spawn(async move { (source.source(), source.search_by_title(&title).await) });
    }

    let mut fetched: Vec<(SourceId, anyhow::Result<Vec<RawRecord>>)> = Vec::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => fetched.push(outcome),
            Err(err) => summary.errors.push(SourceWarning {
                source: "pipeline".to_string(),
                message: format!("source worker panicked: {err}"),
            }),
        }
    }
    fetched.sort_by_key(|(id, _)| *id);

    for (id, result) in fetched {
        let name = id.as_str().to_string();
        let raws = match result {
            Ok(raws) => raws,
            Err(err) => {
                warn!(source = %name, error = %err, "source search failed, contributing zero results");
                summary.errors.push(SourceWarning {
                    source: name.clone(),
                    message: err.to_string(),
                });
                summary.per_source.insert(name, 0);
                continue;
            }
        };

        let mut stored = 0usize;
        for raw in &raws {
            let record = normalize(raw);
            if record.title.is_empty() {
                warn!(source = %name, "skipping record that normalized to an empty title");
                summary.errors.push(SourceWarning {
                    source: name.clone(),
                    message: "record normalized to an empty title".to_string(),
                });
                continue;
            }
            match papers.upsert_paper(&record).await {
                Ok(_) => stored += 1,
                Err(err) => {
                    warn!(source = %name, title = %record.title, error = %err, "upsert failed, continuing");
                    summary.errors.push(SourceWarning {
                        source: name.clone(),
                        message: format!("upsert failed for '{}': {err}", record.title),
                    });
                }
            }
        }

        info!(source = %name, fetched = raws.len(), stored, "source processed");
        summary.papers_found += stored;
        summary.per_source.insert(name, stored);
    }

    summary.duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        papers_found = summary.papers_found,
        warnings = summary.errors.len(),
        duration_ms = summary.duration_ms,
        "ingestion run finished"
    );
    summary
}
