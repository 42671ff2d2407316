//! CSV export. One row per paper; author and keyword lists are comma-joined
//! into single cells, matching the tabular layout of the JSON export.

use std::path::Path;

use paperscout_db::Paper;
use tracing::info;

const HEADER: [&str; 12] = [
    "ID",
    "Title",
    "Authors",
    "Abstract",
    "Keywords",
    "Publish Date",
    "Source",
    "Source ID",
    "PDF URL",
    "PDF Path",
    "Citation Count",
    "Created At",
];

/// Write all papers to a CSV file with a header row.
pub fn export_csv(papers: &[Paper], path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    crate::ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for p in papers {
        let authors = p.authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ");
        let keywords = p.keywords.iter().map(|k| k.keyword.as_str()).collect::<Vec<_>>().join(", ");
        writer.write_record([
            p.id.to_string().as_str(),
            &p.title,
            &authors,
            &p.abstract_text,
            &keywords,
            &p.publish_date.map(|d| d.to_string()).unwrap_or_default(),
            &p.source,
            &p.source_id,
            p.pdf_url.as_deref().unwrap_or(""),
            p.pdf_path.as_deref().unwrap_or(""),
            p.citation_count.to_string().as_str(),
            &p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }

    writer.flush()?;
    info!(count = papers.len(), file = %path.display(), "exported papers to CSV");
    Ok(())
}
