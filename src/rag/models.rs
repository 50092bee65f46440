use serde::{Deserialize, Serialize};

/// Document metadata, copied into the payload of each of its chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentModel {
    pub doc_id: String,
    pub user_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub chunks_count: usize,
    #[serde(default)]
    pub created_at: String,
}

/// Payload stored alongside every chunk vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPayload {
    pub chunk_text: String,
    pub chunk_index: usize,
    pub doc_id: String,
    pub user_id: String,
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub doc_metadata: Option<DocumentModel>,
}

impl VectorPayload {
    /// Document metadata carried by this chunk, rebuilt from the flat fields
    /// when the nested copy is absent.
    pub fn document_metadata(&self) -> DocumentModel {
        match &self.doc_metadata {
            Some(metadata) => metadata.clone(),
            None => DocumentModel {
                doc_id: self.doc_id.clone(),
                user_id: self.user_id.clone(),
                filename: self.filename.clone(),
                file_type: self.file_type.clone(),
                chunks_count: 0,
                created_at: self.created_at.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: VectorPayload,
}

#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: VectorPayload,
}

/// Selects points by owner and/or document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadFilter {
    pub doc_id: Option<String>,
    pub user_id: Option<String>,
}

impl PayloadFilter {
    pub fn user(user_id: &str) -> Self {
        Self {
            doc_id: None,
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn document(doc_id: &str, user_id: Option<&str>) -> Self {
        Self {
            doc_id: Some(doc_id.to_string()),
            user_id: user_id.map(str::to_string),
        }
    }

    pub fn matches(&self, payload: &VectorPayload) -> bool {
        self.doc_id.as_deref().map_or(true, |id| id == payload.doc_id)
            && self.user_id.as_deref().map_or(true, |id| id == payload.user_id)
    }
}

/// A document together with its chunks, ordered by chunk index
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWithChunks {
    #[serde(flatten)]
    pub metadata: DocumentModel,
    pub chunks: Vec<VectorPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: String,
    pub doc_id: String,
    pub filename: String,
    pub file_type: String,
    pub chunks_count: usize,
    pub created_at: String,
    pub user_id: String,
}

impl From<DocumentModel> for DocumentResponse {
    fn from(doc: DocumentModel) -> Self {
        Self {
            id: doc.doc_id.clone(),
            doc_id: doc.doc_id,
            filename: doc.filename,
            file_type: doc.file_type,
            chunks_count: doc.chunks_count,
            created_at: doc.created_at,
            user_id: doc.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    pub doc_id: String,
    pub filename: String,
    pub file_type: String,
    pub chunks_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: String,
    pub filename: String,
    pub chunk_text: String,
    pub score: f32,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
