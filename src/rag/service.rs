// Document service: user-scoped ingestion and retrieval over a vector store

use crate::rag::{
    processors::{chunker, file_extension, load_document, ChunkingOptions, SUPPORTED_EXTENSIONS},
    DeleteResponse, DocumentModel, DocumentUploadResponse, DocumentWithChunks, EmbeddingService,
    PayloadFilter, RAGError, RAGResult, SearchResult, VectorPayload, VectorPoint, VectorStore,
};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Clone)]
pub struct DocumentService {
    embedder: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingOptions,
}

impl DocumentService {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            chunking,
        }
    }

    /// Extract, chunk, embed and store an uploaded file for `user_id`
    pub async fn upload_document(
        &self,
        filename: Option<&str>,
        content: Vec<u8>,
        user_id: &str,
    ) -> RAGResult<DocumentUploadResponse> {
        let filename = match filename.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(RAGError::FileType("No filename provided".to_string())),
        };

        let file_type = file_extension(&filename);
        if !SUPPORTED_EXTENSIONS.contains(&file_type.as_str()) {
            return Err(RAGError::FileType(
                "Unsupported file type. Only .txt, .pdf, and .docx files are supported."
                    .to_string(),
            ));
        }

        let text = load_document(&filename, content).await?;
        if text.trim().is_empty() {
            return Err(RAGError::EmptyDocument(
                "Document appears to be empty or text could not be extracted".to_string(),
            ));
        }

        let chunks = chunker(&text, &self.chunking)?;
        if chunks.is_empty() {
            return Err(RAGError::Chunking(
                "No chunks could be created from the document".to_string(),
            ));
        }

        let chunks: Vec<String> = chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();
        if chunks.is_empty() {
            return Err(RAGError::EmptyDocument(
                "No valid text chunks found in document".to_string(),
            ));
        }

        let vectors = self.embedder.embed_texts(&chunks).await?;

        let doc_uuid = Uuid::new_v4();
        let metadata = DocumentModel {
            doc_id: doc_uuid.to_string(),
            user_id: user_id.to_string(),
            filename: filename.clone(),
            file_type: file_type.clone(),
            chunks_count: chunks.len(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        };

        let points: Vec<VectorPoint> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (chunk_text, vector))| VectorPoint {
                id: Uuid::new_v5(&doc_uuid, index.to_string().as_bytes()).to_string(),
                vector,
                payload: VectorPayload {
                    chunk_text,
                    chunk_index: index,
                    doc_id: metadata.doc_id.clone(),
                    user_id: metadata.user_id.clone(),
                    filename: metadata.filename.clone(),
                    file_type: metadata.file_type.clone(),
                    created_at: metadata.created_at.clone(),
                    doc_metadata: Some(metadata.clone()),
                },
            })
            .collect();

        self.store.save_points(points).await?;

        tracing::info!(
            "Uploaded document {} ({}, {} chunks) for user {}",
            metadata.doc_id,
            metadata.filename,
            metadata.chunks_count,
            user_id
        );

        Ok(DocumentUploadResponse {
            doc_id: metadata.doc_id,
            filename: metadata.filename,
            file_type: metadata.file_type,
            chunks_count: metadata.chunks_count,
            message: "Document uploaded successfully".to_string(),
        })
    }

    pub async fn list_user_documents(&self, user_id: &str) -> RAGResult<Vec<DocumentModel>> {
        self.store.get_unique_documents(Some(user_id)).await
    }

    pub async fn get_user_document(
        &self,
        doc_id: &str,
        user_id: &str,
    ) -> RAGResult<DocumentWithChunks> {
        let mut chunks = self.store.get_points_by_doc_id(doc_id, Some(user_id)).await?;
        let first = chunks
            .first()
            .ok_or_else(|| RAGError::NotFound(format!("Document {} not found", doc_id)))?;

        let mut metadata = first.document_metadata();
        if metadata.chunks_count == 0 {
            metadata.chunks_count = chunks.len();
        }
        chunks.sort_by_key(|chunk| chunk.chunk_index);

        Ok(DocumentWithChunks { metadata, chunks })
    }

    pub async fn delete_user_document(
        &self,
        doc_id: &str,
        user_id: &str,
    ) -> RAGResult<DeleteResponse> {
        if self
            .store
            .get_document_metadata(doc_id, Some(user_id))
            .await?
            .is_none()
        {
            return Err(RAGError::NotFound(format!("Document {} not found", doc_id)));
        }

        self.store.delete_points_by_doc_id(doc_id, Some(user_id)).await?;
        tracing::info!("Deleted document {} for user {}", doc_id, user_id);

        Ok(DeleteResponse {
            message: format!("Document {} deleted successfully", doc_id),
        })
    }

    pub async fn search_user_documents(
        &self,
        query: &str,
        top_k: Option<usize>,
        user_id: &str,
    ) -> RAGResult<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RAGError::EmptyDocument("Query cannot be empty".to_string()));
        }
        let top_k = top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(RAGError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }

        let vector = self.embedder.embed_text(query).await?;
        let hits = self
            .store
            .search(vector, top_k, &PayloadFilter::user(user_id))
            .await?;

        tracing::debug!("Search for user {} returned {} hits", user_id, hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                doc_id: hit.payload.doc_id,
                filename: hit.payload.filename,
                chunk_text: hit.payload.chunk_text,
                score: hit.score,
                chunk_index: hit.payload.chunk_index,
            })
            .collect())
    }

    /// Remove every vector owned by `user_id`
    pub async fn delete_all_user_documents(&self, user_id: &str) -> RAGResult<()> {
        self.store.delete_points_by_user(user_id).await?;
        tracing::info!("Deleted all documents for user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::engines::SimpleVectorStore;
    use async_trait::async_trait;

    const TEST_DIMENSIONS: usize = 8;

    /// Deterministic bag-of-letters embedder
    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingService for FakeEmbedder {
        fn model_name(&self) -> &str {
            "fake"
        }

        fn dimensions(&self) -> usize {
            TEST_DIMENSIONS
        }

        fn batch_size(&self) -> usize {
            4
        }

        async fn embed_batch_raw(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0; TEST_DIMENSIONS];
                    for b in text.to_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                        v[(b - b'a') as usize % TEST_DIMENSIONS] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    fn service(chunk_size: usize, overlap: usize) -> DocumentService {
        DocumentService::new(
            Arc::new(FakeEmbedder),
            Arc::new(SimpleVectorStore::new(TEST_DIMENSIONS)),
            ChunkingOptions::new(chunk_size, overlap).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_upload_stores_one_point_per_chunk() {
        let svc = service(4, 1);
        let text = "one two three four five six seven eight nine ten";
        let resp = svc
            .upload_document(Some("notes.TXT"), text.as_bytes().to_vec(), "alice")
            .await
            .unwrap();

        assert_eq!(resp.message, "Document uploaded successfully");
        assert_eq!(resp.file_type, ".txt");
        assert_eq!(resp.chunks_count, 3);

        let doc = svc.get_user_document(&resp.doc_id, "alice").await.unwrap();
        assert_eq!(doc.metadata.chunks_count, 3);
        let indices: Vec<usize> = doc.chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(doc.chunks[0].chunk_text, "one two three four");
        assert!(doc.chunks.iter().all(|c| c.user_id == "alice"));
    }

    #[tokio::test]
    async fn test_upload_validation_errors() {
        let svc = service(4, 1);

        let err = svc.upload_document(None, b"x".to_vec(), "u").await.unwrap_err();
        assert_eq!(err.to_string(), "No filename provided");

        let err = svc
            .upload_document(Some("image.png"), b"x".to_vec(), "u")
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::FileType(_)));
        assert_eq!(
            err.to_string(),
            "Unsupported file type. Only .txt, .pdf, and .docx files are supported."
        );

        let err = svc
            .upload_document(Some("blank.txt"), b"   \n\t ".to_vec(), "u")
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::EmptyDocument(_)));
    }

    #[tokio::test]
    async fn test_non_printable_only_document_has_no_chunks() {
        let svc = service(4, 1);
        let err = svc
            .upload_document(Some("weird.txt"), "\u{1}\u{2}\u{3}".as_bytes().to_vec(), "u")
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::Chunking(_)));
    }

    #[tokio::test]
    async fn test_documents_are_scoped_to_their_owner() {
        let svc = service(50, 10);
        let alice_doc = svc
            .upload_document(Some("a.txt"), b"apples and bananas".to_vec(), "alice")
            .await
            .unwrap();
        svc.upload_document(Some("b.txt"), b"zebra zoo".to_vec(), "bob")
            .await
            .unwrap();

        let listed = svc.list_user_documents("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].doc_id, alice_doc.doc_id);

        let err = svc
            .get_user_document(&alice_doc.doc_id, "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::NotFound(_)));

        let err = svc
            .delete_user_document(&alice_doc.doc_id, "bob")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Document {} not found", alice_doc.doc_id));

        let results = svc.search_user_documents("zebra", None, "alice").await.unwrap();
        assert!(results.iter().all(|r| r.doc_id == alice_doc.doc_id));
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let svc = service(50, 10);
        let doc = svc
            .upload_document(Some("fruit.txt"), b"apple apple apple".to_vec(), "alice")
            .await
            .unwrap();

        let results = svc.search_user_documents("apple", Some(3), "alice").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].filename, "fruit.txt");
        assert_eq!(results[0].chunk_index, 0);

        let err = svc.search_user_documents("  ", None, "alice").await.unwrap_err();
        assert_eq!(err.to_string(), "Query cannot be empty");

        let err = svc.search_user_documents("apple", Some(0), "alice").await.unwrap_err();
        assert!(matches!(err, RAGError::InvalidInput(_)));

        let resp = svc.delete_user_document(&doc.doc_id, "alice").await.unwrap();
        assert_eq!(resp.message, format!("Document {} deleted successfully", doc.doc_id));
        assert!(svc.list_user_documents("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_user_documents() {
        let svc = service(50, 10);
        for name in ["a.txt", "b.txt"] {
            svc.upload_document(Some(name), b"some words".to_vec(), "alice")
                .await
                .unwrap();
        }
        svc.upload_document(Some("c.txt"), b"other words".to_vec(), "bob")
            .await
            .unwrap();

        svc.delete_all_user_documents("alice").await.unwrap();
        assert!(svc.list_user_documents("alice").await.unwrap().is_empty());
        assert_eq!(svc.list_user_documents("bob").await.unwrap().len(), 1);
    }
}
