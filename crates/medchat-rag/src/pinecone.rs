//! Pinecone vector index over the REST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;

use medchat_core::{Error, IndexEntry, IndexSpec, Metric, Result, ScoredText, VectorIndex, rank};

use crate::config::PineconeConfig;

const API_VERSION: &str = "2024-07";
/// Metadata key holding the chunk text
pub const TEXT_KEY: &str = "text";

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Clone, Deserialize)]
struct IndexDescription {
    name: String,
    dimension: usize,
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: Value,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Value,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Pinecone serverless index client
pub struct PineconeIndex {
    config: PineconeConfig,
    client: Client,
    hosts: RwLock<HashMap<String, String>>,
    ready_poll_interval: Duration,
    ready_poll_attempts: u32,
}

impl PineconeIndex {
    pub fn new(config: PineconeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            hosts: RwLock::new(HashMap::new()),
            ready_poll_interval: Duration::from_secs(2),
            ready_poll_attempts: 60,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(PineconeConfig::from_env()?)
    }

    /// How long to wait for a newly created index to become ready
    pub fn with_ready_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.ready_poll_interval = interval;
        self.ready_poll_attempts = attempts.max(1);
        self
    }

    fn control_url(&self, path: &str) -> Result<url::Url> {
        self.config
            .controller_url
            .join(path)
            .map_err(|e| Error::Configuration(format!("invalid Pinecone URL {}: {}", path, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::Retrieval(format!("Pinecone {} failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::Configuration(format!("Pinecone rejected the API key during {}", what))
            }
            StatusCode::NOT_FOUND => Error::Retrieval(format!("Pinecone {}: not found", what)),
            StatusCode::CONFLICT => Error::Configuration(format!("Pinecone {}: already exists", what)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Error::Data(format!("Pinecone {} rejected the request: {}", what, body))
            }
            _ => Error::Retrieval(format!("Pinecone {} failed with status {}: {}", what, status, body)),
        })
    }

    async fn describe(&self, name: &str) -> Result<IndexDescription> {
        let url = self.control_url(&format!("/indexes/{}", name))?;
        let response = self
            .send(self.client.get(url), &format!("describe index '{}'", name))
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::Retrieval(format!("malformed Pinecone index description: {}", e)))
    }

    async fn data_url(&self, name: &str, path: &str) -> Result<String> {
        if let Some(host) = self.hosts.read().await.get(name) {
            return Ok(format!("{}{}", host, path));
        }

        let description = self.describe(name).await?;
        let host = if description.host.contains("://") {
            description.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", description.host.trim_end_matches('/'))
        };
        self.hosts.write().await.insert(name.to_string(), host.clone());
        Ok(format!("{}{}", host, path))
    }

    async fn wait_until_ready(&self, name: &str) -> Result<()> {
        for attempt in 1..=self.ready_poll_attempts {
            let description = self.describe(name).await?;
            if description.status.ready {
                return Ok(());
            }
            tracing::debug!(index = name, attempt, "waiting for Pinecone index to become ready");
            tokio::time::sleep(self.ready_poll_interval).await;
        }
        Err(Error::Retrieval(format!(
            "index '{}' did not become ready in time",
            name
        )))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let url = self.control_url("/indexes")?;
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: json!({
                "serverless": {
                    "cloud": self.config.cloud,
                    "region": self.config.region,
                }
            }),
        };

        self.send(self.client.post(url).json(&body), &format!("create index '{}'", spec.name))
            .await?;
        tracing::info!(
            index = %spec.name,
            dimension = spec.dimension,
            metric = %spec.metric,
            "created Pinecone index"
        );

        self.wait_until_ready(&spec.name).await
    }

    async fn list_indexes(&self) -> Result<HashSet<String>> {
        let url = self.control_url("/indexes")?;
        let list: IndexList = self
            .send(self.client.get(url), "list indexes")
            .await?
            .json()
            .await
            .map_err(|e| Error::Retrieval(format!("malformed Pinecone index list: {}", e)))?;

        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    async fn index_dimension(&self, name: &str) -> Result<usize> {
        Ok(self.describe(name).await?.dimension)
    }

    async fn upsert(&self, name: &str, entries: Vec<IndexEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let vectors = entries
            .iter()
            .map(|entry| {
                let mut metadata = match &entry.metadata {
                    Value::Object(map) => map.clone(),
                    _ => serde_json::Map::new(),
                };
                metadata.insert(TEXT_KEY.to_string(), Value::String(entry.text.clone()));
                UpsertVector {
                    id: &entry.id,
                    values: &entry.values,
                    metadata: Value::Object(metadata),
                }
            })
            .collect();

        let url = self.data_url(name, "/vectors/upsert").await?;
        let response: UpsertResponse = self
            .send(
                self.client.post(url).json(&UpsertRequest { vectors }),
                &format!("upsert into '{}'", name),
            )
            .await?
            .json()
            .await
            .map_err(|e| Error::Retrieval(format!("malformed Pinecone upsert response: {}", e)))?;

        Ok(response.upserted_count)
    }

    async fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredText>> {
        let url = self.data_url(name, "/query").await?;
        let body = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self
            .send(self.client.post(url).json(&body), &format!("query '{}'", name))
            .await?
            .json()
            .await
            .map_err(|e| Error::Retrieval(format!("malformed Pinecone query response: {}", e)))?;

        let matches = response
            .matches
            .into_iter()
            .filter_map(|m| {
                let mut metadata = match m.metadata {
                    Some(Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                };
                let Some(Value::String(text)) = metadata.remove(TEXT_KEY) else {
                    tracing::warn!(index = name, "skipping match without stored text");
                    return None;
                };
                Some(ScoredText {
                    text,
                    score: m.score,
                    metadata: Value::Object(metadata),
                })
            })
            .collect();

        Ok(rank(matches, k))
    }
}
