//! Schema definitions for the paper store.
//!
//! Surrogate integer primary keys everywhere except the two association
//! tables, which use composite keys of the referenced ids. The pair
//! (source, source_id) is the sole deduplication key for papers; author
//! names and keyword strings are globally unique.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const TABLE_PAPERS: &str = "papers";
pub const TABLE_AUTHORS: &str = "authors";
pub const TABLE_KEYWORDS: &str = "keywords";
pub const TABLE_PAPER_AUTHORS: &str = "paper_authors";
pub const TABLE_PAPER_KEYWORDS: &str = "paper_keywords";

/// DDL executed on first open. Every statement is idempotent.
pub const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS papers (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        title          TEXT NOT NULL,
        abstract       TEXT NOT NULL DEFAULT '',
        publish_date   TEXT,
        source         TEXT NOT NULL,
        source_id      TEXT NOT NULL,
        pdf_url        TEXT,
        pdf_path       TEXT,
        citation_count INTEGER NOT NULL DEFAULT 0,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL,
        UNIQUE (source, source_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        affiliation TEXT,
        email       TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS keywords (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paper_authors (
        paper_id     INTEGER NOT NULL REFERENCES papers (id),
        author_id    INTEGER NOT NULL REFERENCES authors (id),
        author_order INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (paper_id, author_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paper_keywords (
        paper_id   INTEGER NOT NULL REFERENCES papers (id),
        keyword_id INTEGER NOT NULL REFERENCES keywords (id),
        PRIMARY KEY (paper_id, keyword_id)
    )
    "#,
];

/// Canonical paper record, post-normalization.
///
/// Every field has a defined default so a record can always be built from a
/// partially populated source result. `source` holds the display name of the
/// originating source and `source_id` the identifier local to that source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub abstract_text: String,
    pub publish_date: Option<NaiveDate>,
    pub source: String,
    pub source_id: String,
    pub pdf_url: Option<String>,
    pub pdf_path: Option<String>,
    pub citation_count: u32,
    /// Author names, in paper order.
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
}

/// Persisted paper with its associations eagerly resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub abstract_text: String,
    pub publish_date: Option<NaiveDate>,
    pub source: String,
    pub source_id: String,
    pub pdf_url: Option<String>,
    pub pdf_path: Option<String>,
    pub citation_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// In author_order, as ingested.
    pub authors: Vec<Author>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub affiliation: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,
}
