// Vector store trait shared by the Qdrant and in-process engines

use crate::rag::{DocumentModel, PayloadFilter, RAGResult, ScoredPoint, VectorPayload, VectorPoint};
use async_trait::async_trait;
use std::collections::HashMap;

/// Main vector store trait that all engines must implement
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection and its payload indexes if they do not exist yet
    async fn ensure_collection(&self) -> RAGResult<()>;

    /// Upsert points, returning once they are durable
    async fn save_points(&self, points: Vec<VectorPoint>) -> RAGResult<()>;

    /// Nearest neighbours of `vector` among points matching `filter`
    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: &PayloadFilter,
    ) -> RAGResult<Vec<ScoredPoint>>;

    /// Payloads of every point matching `filter`
    async fn scroll(&self, filter: &PayloadFilter) -> RAGResult<Vec<VectorPayload>>;

    /// Remove every point matching `filter`
    async fn delete(&self, filter: &PayloadFilter) -> RAGResult<()>;

    async fn get_points_by_doc_id(
        &self,
        doc_id: &str,
        user_id: Option<&str>,
    ) -> RAGResult<Vec<VectorPayload>> {
        self.scroll(&PayloadFilter::document(doc_id, user_id)).await
    }

    async fn delete_points_by_doc_id(&self, doc_id: &str, user_id: Option<&str>) -> RAGResult<()> {
        self.delete(&PayloadFilter::document(doc_id, user_id)).await
    }

    async fn delete_points_by_user(&self, user_id: &str) -> RAGResult<()> {
        self.delete(&PayloadFilter::user(user_id)).await
    }

    /// One entry per document, in order of first appearance
    async fn get_unique_documents(&self, user_id: Option<&str>) -> RAGResult<Vec<DocumentModel>> {
        let filter = PayloadFilter {
            doc_id: None,
            user_id: user_id.map(str::to_string),
        };
        let payloads = self.scroll(&filter).await?;
        Ok(unique_documents(&payloads))
    }

    async fn get_document_metadata(
        &self,
        doc_id: &str,
        user_id: Option<&str>,
    ) -> RAGResult<Option<DocumentModel>> {
        let payloads = self.get_points_by_doc_id(doc_id, user_id).await?;
        Ok(payloads.first().map(|payload| {
            let mut metadata = payload.document_metadata();
            if metadata.chunks_count == 0 {
                metadata.chunks_count = payloads.len();
            }
            metadata
        }))
    }
}

/// Deduplicate chunk payloads into document metadata. Legacy chunks without
/// a stored chunk count get one from the number of chunks seen.
pub fn unique_documents(payloads: &[VectorPayload]) -> Vec<DocumentModel> {
    let mut order: Vec<String> = Vec::new();
    let mut documents: HashMap<String, DocumentModel> = HashMap::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for payload in payloads {
        *counts.entry(payload.doc_id.as_str()).or_default() += 1;
        if !documents.contains_key(&payload.doc_id) {
            order.push(payload.doc_id.clone());
            documents.insert(payload.doc_id.clone(), payload.document_metadata());
        }
    }

    order
        .into_iter()
        .filter_map(|doc_id| {
            let mut doc = documents.remove(&doc_id)?;
            if doc.chunks_count == 0 {
                doc.chunks_count = counts.get(doc_id.as_str()).copied().unwrap_or(0);
            }
            Some(doc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(doc_id: &str, index: usize, with_metadata: bool) -> VectorPayload {
        VectorPayload {
            chunk_text: format!("chunk {}", index),
            chunk_index: index,
            doc_id: doc_id.to_string(),
            user_id: "u1".to_string(),
            filename: format!("{}.txt", doc_id),
            file_type: ".txt".to_string(),
            created_at: "2024-01-01T00:00:00.000000+00:00".to_string(),
            doc_metadata: with_metadata.then(|| DocumentModel {
                doc_id: doc_id.to_string(),
                user_id: "u1".to_string(),
                filename: format!("{}.txt", doc_id),
                file_type: ".txt".to_string(),
                chunks_count: 7,
                created_at: "2024-01-01T00:00:00.000000+00:00".to_string(),
            }),
        }
    }

    #[test]
    fn test_unique_documents_prefers_stored_metadata() {
        let payloads = vec![payload("a", 0, true), payload("a", 1, true), payload("b", 0, true)];
        let docs = unique_documents(&payloads);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, "a");
        assert_eq!(docs[0].chunks_count, 7);
        assert_eq!(docs[1].doc_id, "b");
    }

    #[test]
    fn test_unique_documents_counts_legacy_chunks() {
        let payloads = vec![payload("old", 0, false), payload("old", 1, false), payload("old", 2, false)];
        let docs = unique_documents(&payloads);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].chunks_count, 3);
        assert_eq!(docs[0].filename, "old.txt");
    }
}
