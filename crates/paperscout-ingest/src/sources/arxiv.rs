//! arXiv API client.
//!
//! Endpoint: http://export.arxiv.org/api/query (Atom feed).
//! arXiv is the one source that serves PDFs without authentication, so this
//! client also handles the optional PDF download into the configured
//! directory.

use std::path::PathBuf;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::PaperSource;
use crate::models::{FetchConfig, RawRecord, SourceId};
use crate::pacing::Pacer;

const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: reqwest::Client,
    pacer: Pacer,
    config: FetchConfig,
    pdf_dir: PathBuf,
}

impl ArxivClient {
    pub fn new(config: FetchConfig, pdf_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();
        Self {
            client,
            pacer: Pacer::new(&config),
            config,
            pdf_dir: pdf_dir.into(),
        }
    }

    /// Fetch the PDF for one entry, skipping files already on disk.
    /// Failures degrade to `None`; the record is kept without a local path.
    #[instrument(skip(self, url))]
    async fn download_pdf(&self, source_id: &str, url: &str) -> Option<String> {
        let filename = format!("arxiv_{source_id}.pdf");
        let path = self.pdf_dir.join(&filename);
        if path.exists() {
            debug!(file = %path.display(), "PDF already downloaded");
            return Some(path.to_string_lossy().into_owned());
        }

        if let Err(err) = tokio::fs::create_dir_all(&self.pdf_dir).await {
            warn!(error = %err, dir = %self.pdf_dir.display(), "cannot create PDF directory");
            return None;
        }

        self.pacer.wait().await;
        let bytes = match self.client.get(url).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.bytes().await.ok()?,
                Err(err) => {
                    warn!(error = %err, source_id, "PDF request rejected");
                    return None;
                }
            },
            Err(err) => {
                warn!(error = %err, source_id, "PDF download failed");
                return None;
            }
        };

        if let Err(err) = tokio::fs::write(&path, &bytes).await {
            warn!(error = %err, file = %path.display(), "cannot write PDF");
            return None;
        }
        info!(file = %path.display(), "downloaded PDF");
        Some(path.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn source(&self) -> SourceId {
        SourceId::Arxiv
    }

    #[instrument(skip(self))]
    async fn search_by_title(&self, title: &str) -> anyhow::Result<Vec<RawRecord>> {
        let query = format!("all:{title}");
        let max = self.config.max_results.to_string();
        let params = [
            ("search_query", query.as_str()),
            ("start", "0"),
            ("max_results", max.as_str()),
        ];

        let xml = self
            .pacer
            .retry("arXiv search", || async move {
                let resp = self
                    .client
                    .get(ARXIV_API_URL)
                    .query(&params)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(resp.text().await?)
            })
            .await?;

        let mut records = parse_atom_feed(&xml);
        records.truncate(self.config.max_results);
        debug!(count = records.len(), "arXiv search returned entries");

        if self.config.download_pdf {
            for record in &mut records {
                let id = record
                    .fields
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|id| id.rsplit('/').next())
                    .unwrap_or_default()
                    .to_string();
                let url = record
                    .fields
                    .get("pdf_url")
                    .and_then(Value::as_str)
                    .map(String::from);
                if let (false, Some(url)) = (id.is_empty(), url) {
                    if let Some(path) = self.download_pdf(&id, &url).await {
                        record.set("pdf_path", path);
                    }
                }
            }
        }

        Ok(records)
    }
}

/// Parse an arXiv Atom feed into raw records.
/// Entries without a title are skipped, never fatal.
fn parse_atom_feed(xml: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<RawRecord> = None;
    let mut authors: Vec<Value> = Vec::new();
    let mut categories: Vec<Value> = Vec::new();
    let mut in_id = false;
    let mut in_title = false;
    let mut in_summary = false;
    let mut in_published = false;
    let mut in_author_name = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => {
                    current = Some(RawRecord::new(SourceId::Arxiv));
                    authors.clear();
                    categories.clear();
                }
                b"id" if current.is_some()        => in_id = true,
                b"title" if current.is_some()     => in_title = true,
                b"summary" if current.is_some()   => in_summary = true,
                b"published" if current.is_some() => in_published = true,
                b"name" if current.is_some()      => in_author_name = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if current.is_some() => match e.name().as_ref() {
                b"category" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"term" {
                            if let Ok(term) = attr.unescape_value() {
                                categories.push(Value::String(term.into_owned()));
                            }
                        }
                    }
                }
                b"link" => {
                    let mut href = None;
                    let mut is_pdf = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"href" => href = attr.unescape_value().ok().map(|v| v.into_owned()),
                            b"title" if attr.value.as_ref() == b"pdf" => is_pdf = true,
                            b"type" if attr.value.as_ref() == b"application/pdf" => is_pdf = true,
                            _ => {}
                        }
                    }
                    if is_pdf {
                        if let (Some(record), Some(href)) = (current.as_mut(), href) {
                            record.set("pdf_url", href);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut record) = current {
                    if in_id        { record.set("id", text.clone()); }
                    if in_title     { record.set("title", text.clone()); }
                    if in_summary   { record.set("summary", text.clone()); }
                    if in_published { record.set("published", text.clone()); }
                    if in_author_name {
                        authors.push(Value::String(text));
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"id"        => in_id = false,
                b"title"     => in_title = false,
                b"summary"   => in_summary = false,
                b"published" => in_published = false,
                b"name"      => in_author_name = false,
                b"entry" => {
                    if let Some(mut record) = current.take() {
                        record.set("authors", Value::Array(authors.clone()));
                        record.set("categories", Value::Array(categories.clone()));
                        if record.fields.get("title").and_then(Value::as_str).is_some() {
                            records.push(record);
                        } else {
                            warn!("skipping arXiv entry with no title");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(error = %err, "arXiv feed parse error");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=all:graph neural networks</title>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <published>2021-01-04T00:00:00Z</published>
    <title>Graph neural networks: a review</title>
    <summary>We survey graph
      neural networks.</summary>
    <author><name>J. Doe</name></author>
    <author><name>K. Lee</name></author>
    <link href="http://arxiv.org/abs/2101.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="stat.ML" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2102.99999v2</id>
    <published>2021-02-01T00:00:00Z</published>
    <title>Another paper</title>
    <summary>Second entry.</summary>
    <author><name>A. Smith</name></author>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_from_atom_feed() {
        let records = parse_atom_feed(FEED);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.fields["id"].as_str().unwrap(),
            "http://arxiv.org/abs/2101.00001v1"
        );
        assert_eq!(
            first.fields["pdf_url"].as_str().unwrap(),
            "http://arxiv.org/pdf/2101.00001v1"
        );
        assert_eq!(first.fields["authors"].as_array().unwrap().len(), 2);
        assert_eq!(first.fields["categories"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn parsed_entries_normalize_cleanly() {
        let records = parse_atom_feed(FEED);
        let record = normalize(&records[0]);

        assert_eq!(record.title, "Graph neural networks: a review");
        assert_eq!(record.abstract_text, "We survey graph neural networks.");
        assert_eq!(record.source, "arXiv");
        assert_eq!(record.source_id, "2101.00001v1");
        assert_eq!(record.authors, ["J. Doe", "K. Lee"]);
    }

    #[test]
    fn feed_title_does_not_leak_into_entries() {
        let records = parse_atom_feed(FEED);
        assert!(records
            .iter()
            .all(|r| r.fields["title"].as_str().unwrap() != "ArXiv Query: search_query=all:graph neural networks"));
    }

    #[test]
    fn garbage_input_yields_no_records() {
        assert!(parse_atom_feed("not xml at all").is_empty());
        assert!(parse_atom_feed("<feed><entry><title>no end tag").is_empty());
    }
}
