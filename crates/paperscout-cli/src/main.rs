//! paperscout — search academic sources and build a local paper database.
//! Entry point for the CLI binary.

mod config;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use paperscout_db::{PaperStore, Store};
use paperscout_ingest::{pipeline, IngestJob, SourceId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Arxiv,
    Semanticscholar,
    Ieee,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "paperscout", version, about = "Search academic sources by title and collect the results into a local database")]
struct Cli {
    /// Paper title (or fragment) to search for.
    #[arg(long)]
    title: String,

    /// Sources to query.
    #[arg(long, value_enum, num_args = 1.., default_value = "all")]
    sources: Vec<SourceArg>,

    /// Export the full database after the run.
    #[arg(long, value_enum, num_args = 1..)]
    export: Vec<ExportFormat>,

    /// Path to a YAML config file. Defaults to ./paperscout.yaml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cap on results per source, overriding the config.
    #[arg(long)]
    max_results: Option<usize>,

    /// Skip downloading PDFs even if the config enables it.
    #[arg(long)]
    skip_pdf: bool,
}

fn selected_sources(args: &[SourceArg]) -> Vec<SourceId> {
    if args.contains(&SourceArg::All) {
        return SourceId::ALL.to_vec();
    }
    let mut out = Vec::new();
    for arg in args {
        let id = match arg {
            SourceArg::Arxiv => SourceId::Arxiv,
            SourceArg::Semanticscholar => SourceId::SemanticScholar,
            SourceArg::Ieee => SourceId::Ieee,
            SourceArg::All => unreachable!(),
        };
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config errors are fatal; a missing default file just means defaults.
    let cfg = config::Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("paperscout={},info", cfg.logging.level))),
        )
        .init();

    info!("paperscout {}", env!("CARGO_PKG_VERSION"));

    let store = Store::open(&cfg.database.path).await?;
    let papers = PaperStore::new(&store);

    let mut job = IngestJob::new(&cli.title);
    job.sources = selected_sources(&cli.sources);
    job.fetch = cfg.scraper.to_fetch_config();
    job.pdf_dir = PathBuf::from(&cfg.export.pdf_dir);
    job.semanticscholar_api_key = cfg.sources.semanticscholar.api_key.clone();
    if let Some(max) = cli.max_results {
        job.fetch.max_results = max;
    }
    if cli.skip_pdf {
        job.fetch.download_pdf = false;
    }

    let summary = pipeline::run(&job, &papers).await;

    println!("Search complete: {} papers stored in {} ms", summary.papers_found, summary.duration_ms);
    for (source, count) in &summary.per_source {
        println!("  {source}: {count}");
    }
    if !summary.errors.is_empty() {
        println!("Warnings:");
        for warning in &summary.errors {
            println!("  [{}] {}", warning.source, warning.message);
        }
    }
    println!("Database now holds {} papers total", papers.count().await?);

    if !cli.export.is_empty() {
        let all = papers.list_papers(None).await?;
        for format in &cli.export {
            match format {
                ExportFormat::Json => {
                    paperscout_export::export_json(&all, &cfg.export.json_path)?;
                    println!("Wrote {}", cfg.export.json_path);
                }
                ExportFormat::Csv => {
                    paperscout_export::export_csv(&all, &cfg.export.csv_path)?;
                    println!("Wrote {}", cfg.export.csv_path);
                }
            }
        }
    }

    Ok(())
}
