//! JSON export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use paperscout_db::Paper;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct PaperJson<'a> {
    id: i64,
    title: &'a str,
    authors: Vec<AuthorJson<'a>>,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
    keywords: Vec<&'a str>,
    publish_date: Option<String>,
    source: &'a str,
    source_id: &'a str,
    pdf_url: Option<&'a str>,
    pdf_path: Option<&'a str>,
    citation_count: i64,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
struct AuthorJson<'a> {
    name: &'a str,
    affiliation: Option<&'a str>,
    email: Option<&'a str>,
}

/// Write all papers to a pretty-printed JSON array.
pub fn export_json(papers: &[Paper], path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    crate::ensure_parent_dir(path)?;

    let rows: Vec<PaperJson<'_>> = papers
        .iter()
        .map(|p| PaperJson {
            id: p.id,
            title: &p.title,
            authors: p
                .authors
                .iter()
                .map(|a| AuthorJson {
                    name: &a.name,
                    affiliation: a.affiliation.as_deref(),
                    email: a.email.as_deref(),
                })
                .collect(),
            abstract_text: &p.abstract_text,
            keywords: p.keywords.iter().map(|k| k.keyword.as_str()).collect(),
            publish_date: p.publish_date.map(|d| d.to_string()),
            source: &p.source,
            source_id: &p.source_id,
            pdf_url: p.pdf_url.as_deref(),
            pdf_path: p.pdf_path.as_deref(),
            citation_count: p.citation_count,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        })
        .collect();

    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &rows)?;
    info!(count = papers.len(), file = %path.display(), "exported papers to JSON");
    Ok(())
}
