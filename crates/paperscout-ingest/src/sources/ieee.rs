//! IEEE Xplore search client.
//!
//! Uses the site's REST search endpoint (a JSON POST, same call the web UI
//! makes). Relative PDF links are resolved against the site base before the
//! record leaves the adapter; everything else stays source-shaped.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::PaperSource;
use crate::models::{FetchConfig, RawRecord, SourceId};
use crate::pacing::Pacer;

const IEEE_BASE_URL: &str = "https://ieeexplore.ieee.org";
const IEEE_SEARCH_URL: &str = "https://ieeexplore.ieee.org/rest/search";

pub struct IeeeClient {
    client: reqwest::Client,
    pacer: Pacer,
    config: FetchConfig,
}

impl IeeeClient {
    pub fn new(config: FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();
        Self { client, pacer: Pacer::new(&config), config }
    }
}

#[async_trait]
impl PaperSource for IeeeClient {
    fn source(&self) -> SourceId {
        SourceId::Ieee
    }

    #[instrument(skip(self))]
    async fn search_by_title(&self, title: &str) -> anyhow::Result<Vec<RawRecord>> {
        let payload = json!({
            "queryText": title,
            "highlight": true,
            "returnFacets": ["ALL"],
            "returnType": "SEARCH",
            "matchPubs": true,
            "rowsPerPage": self.config.max_results.min(100),
        });

        let payload = &payload;
        let body: Value = self
            .pacer
            .retry("IEEE Xplore search", || async move {
                let resp = self
                    .client
                    .post(IEEE_SEARCH_URL)
                    .json(payload)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(resp.json().await?)
            })
            .await?;

        let records = shape_records(&body, self.config.max_results);
        debug!(count = records.len(), "IEEE Xplore search returned records");
        Ok(records)
    }
}

/// Extract raw records from a search response body.
/// Records without a title are skipped, never fatal.
fn shape_records(body: &Value, max_results: usize) -> Vec<RawRecord> {
    let items = body["records"].as_array().cloned().unwrap_or_default();

    let mut records = Vec::new();
    for item in items.into_iter().take(max_results) {
        let Value::Object(mut fields) = item else {
            warn!("skipping non-object IEEE record");
            continue;
        };
        if fields.get("articleTitle").and_then(Value::as_str).is_none() {
            warn!("skipping IEEE record with no title");
            continue;
        }
        if let Some(relative) = fields.get("pdfUrl").and_then(Value::as_str) {
            if relative.starts_with('/') {
                let absolute = format!("{IEEE_BASE_URL}{relative}");
                fields.insert("pdfUrl".to_string(), Value::String(absolute));
            }
        }
        records.push(RawRecord { source: SourceId::Ieee, fields });
    }
    records
}
