//! Normalization of source-shaped records into the canonical schema.
//!
//! This is the single place that knows per-source field names. `normalize`
//! is total: a missing or malformed field degrades to its default (empty
//! string, empty list, zero, no date) instead of failing, so one sparse
//! result never aborts a search.

use chrono::NaiveDate;
use paperscout_db::PaperRecord;
use serde_json::{Map, Value};

use crate::models::{RawRecord, SourceId};

/// Map a raw source result into the canonical paper record.
pub fn normalize(raw: &RawRecord) -> PaperRecord {
    let f = &raw.fields;
    let mut record = match raw.source {
        SourceId::Arxiv => PaperRecord {
            title: clean_text(str_of(f, &["title"])),
            abstract_text: clean_text(str_of(f, &["summary", "abstract"])),
            publish_date: parse_date(str_of(f, &["published"])),
            source_id: arxiv_id(str_of(f, &["id"])),
            pdf_url: opt_string(str_of(f, &["pdf_url"])),
            citation_count: 0,
            authors: name_list(f.get("authors")),
            keywords: name_list(f.get("categories")),
            ..Default::default()
        },
        SourceId::SemanticScholar => PaperRecord {
            title: clean_text(str_of(f, &["title"])),
            abstract_text: clean_text(str_of(f, &["abstract"])),
            publish_date: parse_date(str_of(f, &["publicationDate"]))
                .or_else(|| year_date(f.get("year"))),
            source_id: str_of(f, &["paperId"]).unwrap_or_default().to_string(),
            pdf_url: f
                .get("openAccessPdf")
                .and_then(|pdf| pdf.get("url"))
                .and_then(Value::as_str)
                .map(String::from),
            citation_count: uint_of(f, &["citationCount"]),
            authors: name_list(f.get("authors")),
            keywords: name_list(f.get("fieldsOfStudy")),
            ..Default::default()
        },
        SourceId::Ieee => PaperRecord {
            title: clean_text(str_of(f, &["articleTitle", "title"])),
            abstract_text: clean_text(str_of(f, &["abstract"])),
            publish_date: parse_date(str_of(f, &["publicationDate"]))
                .or_else(|| year_date(f.get("publicationYear"))),
            source_id: str_of(f, &["articleNumber", "documentLink"])
                .unwrap_or_default()
                .to_string(),
            pdf_url: opt_string(str_of(f, &["pdfUrl"])),
            citation_count: uint_of(f, &["citationCount"]),
            authors: name_list(f.get("authors")),
            keywords: ieee_index_terms(f.get("indexTerms")),
            ..Default::default()
        },
    };

    record.source = raw.source.as_str().to_string();
    // Adapters that download files write the local path back into the raw map.
    record.pdf_path = opt_string(str_of(f, &["pdf_path"]));
    record
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn str_of<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| fields.get(*k).and_then(Value::as_str))
}

fn uint_of(fields: &Map<String, Value>, keys: &[&str]) -> u32 {
    keys.iter()
        .find_map(|k| fields.get(*k).and_then(Value::as_u64))
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

fn opt_string(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(String::from)
}

/// Collapse runs of whitespace; arXiv titles and abstracts carry hard wraps.
fn clean_text(s: Option<&str>) -> String {
    s.map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Accepts an array of plain strings or of objects carrying a name-ish key.
fn name_list(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => ["name", "normalizedName", "preferredName", "fullName"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(String::from),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// IEEE groups keywords by vocabulary: {"IEEE Terms": [{"term": …}], …}.
fn ieee_index_terms(value: Option<&Value>) -> Vec<String> {
    const VOCABULARIES: [&str; 3] = ["IEEE Terms", "Author Keywords", "INSPEC Controlled Terms"];

    let Some(groups) = value.and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut terms = Vec::new();
    for group in VOCABULARIES.iter().filter_map(|v| groups.get(*v)) {
        if let Some(entries) = group.as_array() {
            for entry in entries {
                if let Some(term) = entry.get("term").and_then(Value::as_str) {
                    if !term.is_empty() {
                        terms.push(term.to_string());
                    }
                }
            }
        }
    }
    terms
}

/// Parse a date string: plain ISO date first, then RFC 3339 timestamps.
fn parse_date(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| chrono::DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// A bare publication year maps to January 1st of that year.
fn year_date(value: Option<&Value>) -> Option<NaiveDate> {
    let year = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year as i32, 1, 1)
}

/// Last path segment of an arXiv entry URL, e.g.
/// `http://arxiv.org/abs/2101.00001v1` → `2101.00001v1`.
fn arxiv_id(entry_id: Option<&str>) -> String {
    entry_id
        .and_then(|id| id.rsplit('/').next())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(source: SourceId, value: Value) -> RawRecord {
        RawRecord {
            source,
            fields: value.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn empty_raw_record_normalizes_to_defaults() {
        for source in SourceId::ALL {
            let record = normalize(&RawRecord::new(source));
            assert_eq!(record.title, "");
            assert_eq!(record.abstract_text, "");
            assert!(record.publish_date.is_none());
            assert_eq!(record.source, source.as_str());
            assert_eq!(record.citation_count, 0);
            assert!(record.authors.is_empty());
            assert!(record.keywords.is_empty());
        }
    }

    #[test]
    fn arxiv_fields_map_to_canonical() {
        let record = normalize(&raw(
            SourceId::Arxiv,
            json!({
                "id": "http://arxiv.org/abs/2101.00001v1",
                "title": "Graph  neural\n networks",
                "summary": "An   abstract.",
                "published": "2021-01-04T00:00:00Z",
                "authors": ["Alice", "Bob"],
                "categories": ["cs.LG", "stat.ML"],
                "pdf_url": "http://arxiv.org/pdf/2101.00001v1",
                "pdf_path": "output/pdfs/arxiv_2101.00001v1.pdf"
            }),
        ));

        assert_eq!(record.title, "Graph neural networks");
        assert_eq!(record.abstract_text, "An abstract.");
        assert_eq!(record.source_id, "2101.00001v1");
        assert_eq!(record.publish_date, NaiveDate::from_ymd_opt(2021, 1, 4));
        assert_eq!(record.authors, ["Alice", "Bob"]);
        assert_eq!(record.keywords, ["cs.LG", "stat.ML"]);
        assert_eq!(record.pdf_path.as_deref(), Some("output/pdfs/arxiv_2101.00001v1.pdf"));
    }

    #[test]
    fn semantic_scholar_fields_map_to_canonical() {
        let record = normalize(&raw(
            SourceId::SemanticScholar,
            json!({
                "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
                "title": "Attention is all you need",
                "abstract": "Transformers.",
                "year": 2017,
                "citationCount": 90000,
                "authors": [{"authorId": "1", "name": "A. Vaswani"}],
                "fieldsOfStudy": ["Computer Science"],
                "openAccessPdf": {"url": "https://example.org/p.pdf"}
            }),
        ));

        assert_eq!(record.source_id, "649def34f8be52c8b66281af98ae884c09aef38b");
        assert_eq!(record.publish_date, NaiveDate::from_ymd_opt(2017, 1, 1));
        assert_eq!(record.citation_count, 90000);
        assert_eq!(record.authors, ["A. Vaswani"]);
        assert_eq!(record.pdf_url.as_deref(), Some("https://example.org/p.pdf"));
    }

    #[test]
    fn ieee_fields_map_to_canonical() {
        let record = normalize(&raw(
            SourceId::Ieee,
            json!({
                "articleTitle": "Deep learning on FPGAs",
                "abstract": "Hardware.",
                "articleNumber": "8578572",
                "publicationDate": "2019-06-15",
                "citationCount": 12,
                "authors": [
                    {"normalizedName": "J. Doe"},
                    {"preferredName": "K. Lee"}
                ],
                "indexTerms": {
                    "IEEE Terms": [{"term": "Deep learning"}],
                    "Author Keywords": [{"term": "FPGA"}]
                },
                "pdfUrl": "https://ieeexplore.ieee.org/stamp/8578572"
            }),
        ));

        assert_eq!(record.title, "Deep learning on FPGAs");
        assert_eq!(record.source_id, "8578572");
        assert_eq!(record.publish_date, NaiveDate::from_ymd_opt(2019, 6, 15));
        assert_eq!(record.authors, ["J. Doe", "K. Lee"]);
        assert_eq!(record.keywords, ["Deep learning", "FPGA"]);
    }

    #[test]
    fn year_only_dates_fall_back_to_january_first() {
        let record = normalize(&raw(
            SourceId::Ieee,
            json!({"articleTitle": "T", "publicationYear": "2020"}),
        ));
        assert_eq!(record.publish_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn malformed_field_types_degrade_to_defaults() {
        let record = normalize(&raw(
            SourceId::SemanticScholar,
            json!({
                "title": 42,
                "authors": "not an array",
                "citationCount": "lots",
                "year": []
            }),
        ));
        assert_eq!(record.title, "");
        assert!(record.authors.is_empty());
        assert_eq!(record.citation_count, 0);
        assert!(record.publish_date.is_none());
    }
}
