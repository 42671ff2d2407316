//! Semantic Scholar Graph API client.
//!
//! Endpoint: https://api.semanticscholar.org/graph/v1/paper/search
//! Works unauthenticated at a low rate; an API key raises the quota and is
//! passed via the `x-api-key` header when configured.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::PaperSource;
use crate::models::{FetchConfig, RawRecord, SourceId};
use crate::pacing::Pacer;

const S2_SEARCH_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const S2_FIELDS: &str = "title,abstract,year,publicationDate,authors,citationCount,openAccessPdf,fieldsOfStudy";

pub struct SemanticScholarClient {
    client: reqwest::Client,
    pacer: Pacer,
    config: FetchConfig,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(config: FetchConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();
        Self {
            client,
            pacer: Pacer::new(&config),
            config,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    fn source(&self) -> SourceId {
        SourceId::SemanticScholar
    }

    #[instrument(skip(self))]
    async fn search_by_title(&self, title: &str) -> anyhow::Result<Vec<RawRecord>> {
        // The API caps page size at 100.
        let limit = self.config.max_results.min(100).to_string();
        let params = [
            ("query", title),
            ("limit", limit.as_str()),
            ("fields", S2_FIELDS),
        ];

        let body: Value = self
            .pacer
            .retry("Semantic Scholar search", || async move {
                let mut req = self.client.get(S2_SEARCH_URL).query(&params);
                if let Some(key) = &self.api_key {
                    req = req.header("x-api-key", key);
                }
                // 429s from the public pool are the common transient failure.
                let resp = req.send().await?.error_for_status()?;
                Ok(resp.json().await?)
            })
            .await?;

        let items = body["data"].as_array().cloned().unwrap_or_default();
        debug!(count = items.len(), "Semantic Scholar search returned results");

        let mut records = Vec::new();
        for item in items.into_iter().take(self.config.max_results) {
            let Value::Object(fields) = item else {
                warn!("skipping non-object Semantic Scholar result");
                continue;
            };
            if fields.get("title").and_then(Value::as_str).is_none() {
                warn!("skipping Semantic Scholar result with no title");
                continue;
            }
            records.push(RawRecord { source: SourceId::SemanticScholar, fields });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_dropped_when_empty() {
        let with_key = SemanticScholarClient::new(FetchConfig::default(), Some("k".into()));
        let empty = SemanticScholarClient::new(FetchConfig::default(), Some(String::new()));
        let none = SemanticScholarClient::new(FetchConfig::default(), None);

        assert!(with_key.api_key.is_some());
        assert!(empty.api_key.is_none());
        assert!(none.api_key.is_none());
    }
}
