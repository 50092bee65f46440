// Qdrant vector store over the REST API

use super::traits::VectorStore;
use crate::rag::{PayloadFilter, RAGError, RAGResult, ScoredPoint, VectorPayload, VectorPoint};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Points fetched per scroll request
const SCROLL_PAGE_SIZE: usize = 256;

/// Payload fields indexed for filtering, with their Qdrant schema
const PAYLOAD_INDEXES: [(&str, &str); 6] = [
    ("user_id", "keyword"),
    ("doc_id", "keyword"),
    ("filename", "keyword"),
    ("file_type", "keyword"),
    ("created_at", "text"),
    ("chunk_index", "integer"),
];

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<QdrantScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct QdrantScoredPoint {
    id: Value,
    score: f32,
    payload: Option<VectorPayload>,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<QdrantRecord>,
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantRecord {
    payload: Option<VectorPayload>,
}

fn point_id(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Qdrant filter equivalent of a payload filter
pub fn filter_json(filter: &PayloadFilter) -> Value {
    let mut must = Vec::new();
    if let Some(user_id) = &filter.user_id {
        must.push(json!({ "key": "user_id", "match": { "value": user_id } }));
    }
    if let Some(doc_id) = &filter.doc_id {
        must.push(json!({ "key": "doc_id", "match": { "value": doc_id } }));
    }
    json!({ "must": must })
}

pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    vector_size: usize,
    ready: OnceCell<()>,
}

impl QdrantStore {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        collection: &str,
        vector_size: usize,
    ) -> RAGResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RAGError::VectorCollection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection: collection.to_string(),
            vector_size,
            ready: OnceCell::new(),
        })
    }

    fn collection_url(&self, path: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, path)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    /// Send a request and decode the `result` field of the response envelope.
    /// `to_error` chooses which error variant failures map to.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        to_error: fn(String) -> RAGError,
    ) -> RAGResult<T> {
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| to_error(format!("Qdrant request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(to_error(format!("HTTP {}: {}", status, error_text)));
        }

        let envelope: QdrantResponse<T> = response
            .json()
            .await
            .map_err(|e| to_error(format!("Invalid Qdrant response: {}", e)))?;
        Ok(envelope.result)
    }

    async fn collection_exists(&self) -> RAGResult<bool> {
        let response = self
            .request(Method::GET, &self.collection_url(""))
            .send()
            .await
            .map_err(|e| RAGError::VectorCollection(format!("Qdrant request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(RAGError::VectorCollection(format!(
                    "HTTP {}: {}",
                    status, error_text
                )))
            }
        }
    }

    async fn create_collection(&self) -> RAGResult<()> {
        let _: Value = self
            .call(
                Method::PUT,
                &self.collection_url(""),
                Some(json!({
                    "vectors": { "size": self.vector_size, "distance": "Cosine" }
                })),
                RAGError::VectorCollection,
            )
            .await?;

        for (field_name, schema) in PAYLOAD_INDEXES {
            let _: Value = self
                .call(
                    Method::PUT,
                    &self.collection_url("/index?wait=true"),
                    Some(json!({ "field_name": field_name, "field_schema": schema })),
                    RAGError::VectorCollection,
                )
                .await?;
        }

        tracing::info!(
            "Created Qdrant collection {} ({} dimensions, cosine)",
            self.collection,
            self.vector_size
        );
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self) -> RAGResult<()> {
        self.ready
            .get_or_try_init(|| async {
                if !self.collection_exists().await? {
                    self.create_collection().await?;
                }
                Ok::<(), RAGError>(())
            })
            .await?;
        Ok(())
    }

    async fn save_points(&self, points: Vec<VectorPoint>) -> RAGResult<()> {
        self.ensure_collection().await?;

        let count = points.len();
        let points: Vec<Value> = points
            .into_iter()
            .map(|p| json!({ "id": p.id, "vector": p.vector, "payload": p.payload }))
            .collect();

        let _: Value = self
            .call(
                Method::PUT,
                &self.collection_url("/points?wait=true"),
                Some(json!({ "points": points })),
                RAGError::Point,
            )
            .await?;

        tracing::debug!("Upserted {} points into {}", count, self.collection);
        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: &PayloadFilter,
    ) -> RAGResult<Vec<ScoredPoint>> {
        self.ensure_collection().await?;

        let result: QueryResult = self
            .call(
                Method::POST,
                &self.collection_url("/points/query"),
                Some(json!({
                    "query": vector,
                    "filter": filter_json(filter),
                    "limit": top_k,
                    "with_payload": true,
                    "with_vector": false,
                })),
                RAGError::Point,
            )
            .await?;

        Ok(result
            .points
            .into_iter()
            .filter_map(|p| {
                let payload = p.payload?;
                Some(ScoredPoint {
                    id: point_id(p.id),
                    score: p.score,
                    payload,
                })
            })
            .collect())
    }

    async fn scroll(&self, filter: &PayloadFilter) -> RAGResult<Vec<VectorPayload>> {
        self.ensure_collection().await?;

        let mut payloads = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "filter": filter_json(filter),
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": true,
                "with_vector": false,
            });
            if let Some(offset) = offset.take() {
                body["offset"] = offset;
            }

            let page: ScrollResult = self
                .call(
                    Method::POST,
                    &self.collection_url("/points/scroll"),
                    Some(body),
                    RAGError::Point,
                )
                .await?;

            payloads.extend(page.points.into_iter().filter_map(|p| p.payload));

            match page.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        Ok(payloads)
    }

    async fn delete(&self, filter: &PayloadFilter) -> RAGResult<()> {
        self.ensure_collection().await?;

        let _: Value = self
            .call(
                Method::POST,
                &self.collection_url("/points/delete?wait=true"),
                Some(json!({ "filter": filter_json(filter) })),
                RAGError::Point,
            )
            .await?;
        Ok(())
    }
}
