// Embedding service for generating vector representations

use crate::rag::{RAGError, RAGResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding service trait
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Name of the model producing the vectors
    fn model_name(&self) -> &str;

    /// Length of every vector this service returns
    fn dimensions(&self) -> usize;

    /// Maximum number of texts sent to the model at once
    fn batch_size(&self) -> usize;

    /// Embed one batch of at most `batch_size()` texts
    async fn embed_batch_raw(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>>;

    /// Generate embeddings for multiple texts, batching and checking dimensions
    async fn embed_texts(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>> {
        let batch_size = self.batch_size().max(1);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts) with {}",
                batch_index,
                batch.len(),
                self.model_name()
            );
            let vectors = self.embed_batch_raw(batch).await?;
            if vectors.len() != batch.len() {
                return Err(RAGError::Embedding(format!(
                    "Embedding model returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }

        for vector in &embeddings {
            if vector.len() != self.dimensions() {
                return Err(RAGError::Embedding(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dimensions(),
                    vector.len()
                )));
            }
        }

        Ok(embeddings)
    }

    /// Generate embeddings for a single text
    async fn embed_text(&self, text: &str) -> RAGResult<Vec<f32>> {
        self.embed_texts(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RAGError::Embedding("Embedding model returned no vector".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embeddings from any server that speaks the OpenAI `/embeddings` API
pub struct OpenAICompatibleEmbeddingService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAICompatibleEmbeddingService {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        dimensions: usize,
        batch_size: usize,
    ) -> RAGResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| RAGError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            dimensions,
            batch_size,
        })
    }
}

#[async_trait]
impl EmbeddingService for OpenAICompatibleEmbeddingService {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch_raw(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let mut req_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| RAGError::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RAGError::Embedding(format!("HTTP {}: {}", status, error_text)));
        }

        let mut body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RAGError::Embedding(format!("Invalid embedding response: {}", e)))?;

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        dims: usize,
    }

    #[async_trait]
    impl EmbeddingService for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn batch_size(&self) -> usize {
            2
        }

        async fn embed_batch_raw(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_texts_are_batched_in_order() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
            dims: 2,
        };
        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let vectors = embedder.embed_texts(&texts).await.unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
            dims: 3,
        };
        let err = embedder.embed_text("hello").await.unwrap_err();
        assert!(matches!(err, RAGError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
            dims: 2,
        };
        assert!(embedder.embed_texts(&[]).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }
}
