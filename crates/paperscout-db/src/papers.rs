//! Paper repository.
//!
//! Deduplicating upsert plus query operations over the entity graph.
//! Each upsert runs in a single transaction: a caller never observes a paper
//! with only part of its authors or keywords attached. Unique-key collisions
//! (two workers racing on the same paper, author or keyword) are collapsed
//! with `ON CONFLICT DO NOTHING` followed by a re-select, not with locks.

use std::collections::HashMap;

use sqlx::sqlite::SqlitePool;
use sqlx::{FromRow, Sqlite, Transaction};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::schema::{Author, Keyword, Paper, PaperRecord};
use crate::store::Store;

/// Repository for paper operations.
#[derive(Clone)]
pub struct PaperStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct PaperRow {
    id: i64,
    title: String,
    #[sqlx(rename = "abstract")]
    abstract_text: String,
    publish_date: Option<chrono::NaiveDate>,
    source: String,
    source_id: String,
    pdf_url: Option<String>,
    pdf_path: Option<String>,
    citation_count: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(FromRow)]
struct AuthorLink {
    paper_id: i64,
    id: i64,
    name: String,
    affiliation: Option<String>,
    email: Option<String>,
}

#[derive(FromRow)]
struct KeywordLink {
    paper_id: i64,
    id: i64,
    keyword: String,
}

impl PaperStore {
    pub fn new(store: &Store) -> Self {
        Self { pool: store.pool().clone() }
    }

    // ── Upsert ───────────────────────────────────────────────────────────────

    /// Insert a canonical record, or return the already-stored paper when one
    /// exists for the same (source, source_id). Existing papers are returned
    /// unchanged: no field update, no new associations. This makes
    /// re-ingestion idempotent.
    pub async fn upsert_paper(&self, record: &PaperRecord) -> Result<Paper> {
        if record.title.is_empty() {
            return Err(StoreError::InvalidRecord("empty title".into()));
        }

        let mut tx = self.pool.begin().await?;

        if let Some(id) = self.find_id(&mut tx, &record.source, &record.source_id).await? {
            tx.commit().await?;
            debug!(paper_id = id, source = %record.source, "paper already stored, returning existing");
            return self.get_paper(id).await;
        }

        let now = chrono::Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO papers
                (title, abstract, publish_date, source, source_id,
                 pdf_url, pdf_path, citation_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (source, source_id) DO NOTHING
            "#,
        )
        .bind(&record.title)
        .bind(&record.abstract_text)
        .bind(record.publish_date)
        .bind(&record.source)
        .bind(&record.source_id)
        .bind(&record.pdf_url)
        .bind(&record.pdf_path)
        .bind(record.citation_count as i64)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // Another writer created the paper between our select and insert.
            let id = self
                .find_id(&mut tx, &record.source, &record.source_id)
                .await?
                .ok_or_else(|| StoreError::InvalidRecord("conflicting paper vanished".into()))?;
            tx.commit().await?;
            return self.get_paper(id).await;
        }
        let paper_id = inserted.last_insert_rowid();

        for (order, name) in record.authors.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            sqlx::query("INSERT INTO authors (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            let author_id: i64 = sqlx::query_scalar("SELECT id FROM authors WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
            // OR IGNORE guards against the same name listed twice on one paper.
            sqlx::query(
                "INSERT OR IGNORE INTO paper_authors (paper_id, author_id, author_order) \
                 VALUES (?, ?, ?)",
            )
            .bind(paper_id)
            .bind(author_id)
            .bind(order as i64)
            .execute(&mut *tx)
            .await?;
        }

        for keyword in &record.keywords {
            if keyword.is_empty() {
                continue;
            }
            sqlx::query("INSERT INTO keywords (keyword) VALUES (?) ON CONFLICT (keyword) DO NOTHING")
                .bind(keyword)
                .execute(&mut *tx)
                .await?;
            let keyword_id: i64 = sqlx::query_scalar("SELECT id FROM keywords WHERE keyword = ?")
                .bind(keyword)
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT OR IGNORE INTO paper_keywords (paper_id, keyword_id) VALUES (?, ?)",
            )
            .bind(paper_id)
            .bind(keyword_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(paper_id, source = %record.source, source_id = %record.source_id, "inserted new paper");
        self.get_paper(paper_id).await
    }

    async fn find_id(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        source: &str,
        source_id: &str,
    ) -> Result<Option<i64>> {
        let id = sqlx::query_scalar("SELECT id FROM papers WHERE source = ? AND source_id = ?")
            .bind(source)
            .bind(source_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(id)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Fetch one paper with authors and keywords resolved.
    pub async fn get_paper(&self, id: i64) -> Result<Paper> {
        let row: Option<PaperRow> = sqlx::query_as("SELECT * FROM papers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let row = row.ok_or(StoreError::PaperNotFound(id))?;

        let mut papers = self.attach_associations(vec![row]).await?;
        papers.pop().ok_or(StoreError::PaperNotFound(id))
    }

    /// All papers, optionally filtered by source, with authors and keywords
    /// eagerly resolved (three queries total, no per-paper lookups).
    pub async fn list_papers(&self, source: Option<&str>) -> Result<Vec<Paper>> {
        let rows: Vec<PaperRow> = match source {
            Some(source) => {
                sqlx::query_as("SELECT * FROM papers WHERE source = ? ORDER BY id")
                    .bind(source)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM papers ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        self.attach_associations(rows).await
    }

    /// Case-insensitive substring match on the title.
    pub async fn search_by_title(&self, fragment: &str) -> Result<Vec<Paper>> {
        let rows: Vec<PaperRow> =
            sqlx::query_as("SELECT * FROM papers WHERE title LIKE '%' || ? || '%' ORDER BY id")
                .bind(fragment)
                .fetch_all(&self.pool)
                .await?;
        self.attach_associations(rows).await
    }

    pub async fn count(&self) -> Result<i64> {
        let n = sqlx::query_scalar("SELECT COUNT(*) FROM papers")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn attach_associations(&self, rows: Vec<PaperRow>) -> Result<Vec<Paper>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let author_links: Vec<AuthorLink> = sqlx::query_as(
            r#"
            SELECT pa.paper_id, a.id, a.name, a.affiliation, a.email
            FROM paper_authors pa
            JOIN authors a ON a.id = pa.author_id
            ORDER BY pa.paper_id, pa.author_order
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let keyword_links: Vec<KeywordLink> = sqlx::query_as(
            r#"
            SELECT pk.paper_id, k.id, k.keyword
            FROM paper_keywords pk
            JOIN keywords k ON k.id = pk.keyword_id
            ORDER BY pk.paper_id, k.keyword
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut authors_by_paper: HashMap<i64, Vec<Author>> = HashMap::new();
        for link in author_links {
            authors_by_paper.entry(link.paper_id).or_default().push(Author {
                id: link.id,
                name: link.name,
                affiliation: link.affiliation,
                email: link.email,
            });
        }

        let mut keywords_by_paper: HashMap<i64, Vec<Keyword>> = HashMap::new();
        for link in keyword_links {
            keywords_by_paper
                .entry(link.paper_id)
                .or_default()
                .push(Keyword { id: link.id, keyword: link.keyword });
        }

        Ok(rows
            .into_iter()
            .map(|row| Paper {
                authors: authors_by_paper.remove(&row.id).unwrap_or_default(),
                keywords: keywords_by_paper.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                abstract_text: row.abstract_text,
                publish_date: row.publish_date,
                source: row.source,
                source_id: row.source_id,
                pdf_url: row.pdf_url,
                pdf_path: row.pdf_path,
                citation_count: row.citation_count,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> PaperStore {
        let store = Store::open_in_memory().await.unwrap();
        PaperStore::new(&store)
    }

    fn record(source: &str, source_id: &str, title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            source: source.to_string(),
            source_id: source_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let papers = test_store().await;

        let mut rec = record("arXiv", "2101.00001v1", "Graph neural networks");
        rec.authors = vec!["J. Doe".into()];
        rec.keywords = vec!["cs.LG".into()];

        let first = papers.upsert_paper(&rec).await.unwrap();
        let second = papers.upsert_paper(&rec).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(papers.count().await.unwrap(), 1);
        assert_eq!(second.authors.len(), 1);
        assert_eq!(second.keywords.len(), 1);
    }

    #[tokio::test]
    async fn existing_paper_is_returned_unchanged() {
        let papers = test_store().await;

        let rec = record("arXiv", "2101.00001v1", "Original title");
        papers.upsert_paper(&rec).await.unwrap();

        let mut resight = record("arXiv", "2101.00001v1", "Different title");
        resight.authors = vec!["New Author".into()];
        let got = papers.upsert_paper(&resight).await.unwrap();

        assert_eq!(got.title, "Original title");
        assert!(got.authors.is_empty());
    }

    #[tokio::test]
    async fn authors_are_deduplicated_globally() {
        let papers = test_store().await;

        let mut a = record("arXiv", "1", "Paper one");
        a.authors = vec!["A. Smith".into()];
        let mut b = record("IEEE Xplore", "2", "Paper two");
        b.authors = vec!["A. Smith".into(), "B. Jones".into()];

        let first = papers.upsert_paper(&a).await.unwrap();
        let second = papers.upsert_paper(&b).await.unwrap();

        assert_eq!(first.authors[0].id, second.authors[0].id);

        let author_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&papers.pool)
            .await
            .unwrap();
        assert_eq!(author_count, 2);
    }

    #[tokio::test]
    async fn keywords_are_deduplicated_globally() {
        let papers = test_store().await;

        let mut a = record("arXiv", "1", "Paper one");
        a.keywords = vec!["deep learning".into()];
        let mut b = record("arXiv", "2", "Paper two");
        b.keywords = vec!["deep learning".into(), "graphs".into()];

        papers.upsert_paper(&a).await.unwrap();
        papers.upsert_paper(&b).await.unwrap();

        let keyword_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM keywords")
            .fetch_one(&papers.pool)
            .await
            .unwrap();
        assert_eq!(keyword_count, 2);
    }

    #[tokio::test]
    async fn author_order_is_preserved() {
        let papers = test_store().await;

        let mut rec = record("arXiv", "1", "Ordered authors");
        rec.authors = vec!["Alice".into(), "Bob".into(), "Carol".into()];
        papers.upsert_paper(&rec).await.unwrap();

        // Seed another paper listing Carol first so global author ids do not
        // happen to match paper order.
        let mut other = record("arXiv", "2", "Other");
        other.authors = vec!["Carol".into(), "Alice".into()];
        papers.upsert_paper(&other).await.unwrap();

        let all = papers.list_papers(None).await.unwrap();
        let names: Vec<&str> = all[0].authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        let names: Vec<&str> = all[1].authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Carol", "Alice"]);
    }

    #[tokio::test]
    async fn duplicate_author_on_one_paper_is_attached_once() {
        let papers = test_store().await;

        let mut rec = record("arXiv", "1", "Repeated author");
        rec.authors = vec!["A. Smith".into(), "A. Smith".into()];
        let paper = papers.upsert_paper(&rec).await.unwrap();

        assert_eq!(paper.authors.len(), 1);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let papers = test_store().await;
        let err = papers.upsert_paper(&record("arXiv", "1", "")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn list_filters_by_source() {
        let papers = test_store().await;
        papers.upsert_paper(&record("arXiv", "1", "A")).await.unwrap();
        papers.upsert_paper(&record("IEEE Xplore", "1", "B")).await.unwrap();

        assert_eq!(papers.list_papers(Some("arXiv")).await.unwrap().len(), 1);
        assert_eq!(papers.list_papers(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive() {
        let papers = test_store().await;
        papers
            .upsert_paper(&record("arXiv", "1", "Graph Neural Networks"))
            .await
            .unwrap();

        let hits = papers.search_by_title("neural").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(papers.search_by_title("quantum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_source_id_in_different_sources_is_two_papers() {
        let papers = test_store().await;
        papers.upsert_paper(&record("arXiv", "shared", "A")).await.unwrap();
        papers.upsert_paper(&record("IEEE Xplore", "shared", "B")).await.unwrap();
        assert_eq!(papers.count().await.unwrap(), 2);
    }
}
