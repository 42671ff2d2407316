//! paperscout-export — render the unified paper set to files.
//!
//! Consumes fully resolved papers from `paperscout-db` and serializes every
//! field of every record. No invariants live here; the store is the source of
//! truth and these modules are pure formatting.

pub mod csv;
pub mod json;

pub use crate::csv::export_csv;
pub use crate::json::export_json;

use std::path::Path;

/// Create the parent directory of an output path if needed.
pub(crate) fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};
    use paperscout_db::{Author, Keyword, Paper};

    /// Two resolved papers covering the populated and the sparse case.
    pub(crate) fn sample_papers() -> Vec<Paper> {
        let created = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        vec![
            Paper {
                id: 1,
                title: "Graph neural networks".to_string(),
                abstract_text: "A survey of message passing on graphs.".to_string(),
                publish_date: NaiveDate::from_ymd_opt(2021, 1, 4),
                source: "arXiv".to_string(),
                source_id: "2101.00001".to_string(),
                pdf_url: Some("http://arxiv.org/pdf/2101.00001".to_string()),
                pdf_path: Some("output/pdfs/arxiv_2101.00001.pdf".to_string()),
                citation_count: 12,
                created_at: created,
                updated_at: created,
                authors: vec![
                    Author { id: 1, name: "J. Doe".to_string(), affiliation: None, email: None },
                    Author { id: 2, name: "K. Lee".to_string(), affiliation: None, email: None },
                ],
                keywords: vec![
                    Keyword { id: 1, keyword: "cs.LG".to_string() },
                    Keyword { id: 2, keyword: "stat.ML".to_string() },
                ],
            },
            Paper {
                id: 2,
                title: "Sparse result".to_string(),
                abstract_text: String::new(),
                publish_date: None,
                source: "IEEE Xplore".to_string(),
                source_id: "9000001".to_string(),
                pdf_url: None,
                pdf_path: None,
                citation_count: 0,
                created_at: created,
                updated_at: created,
                authors: vec![],
                keywords: vec![],
            },
        ]
    }
}
