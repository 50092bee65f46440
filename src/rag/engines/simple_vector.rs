// In-process vector store used by the memory backend and tests

use super::traits::VectorStore;
use crate::rag::{PayloadFilter, RAGError, RAGResult, ScoredPoint, VectorPayload, VectorPoint};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

struct StoredPoint {
    vector: Vec<f32>,
    payload: VectorPayload,
}

/// Brute-force cosine similarity over every stored point
pub struct SimpleVectorStore {
    dimensions: usize,
    points: RwLock<BTreeMap<String, StoredPoint>>,
}

impl SimpleVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            points: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for SimpleVectorStore {
    async fn ensure_collection(&self) -> RAGResult<()> {
        Ok(())
    }

    async fn save_points(&self, points: Vec<VectorPoint>) -> RAGResult<()> {
        if let Some(bad) = points.iter().find(|p| p.vector.len() != self.dimensions) {
            return Err(RAGError::Point(format!(
                "Point {} has {} dimensions, collection expects {}",
                bad.id,
                bad.vector.len(),
                self.dimensions
            )));
        }

        let mut stored = self.points.write().await;
        for point in points {
            stored.insert(
                point.id,
                StoredPoint {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: &PayloadFilter,
    ) -> RAGResult<Vec<ScoredPoint>> {
        if vector.len() != self.dimensions {
            return Err(RAGError::Point(format!(
                "Query vector has {} dimensions, collection expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        let stored = self.points.read().await;
        let mut scored: Vec<ScoredPoint> = stored
            .iter()
            .filter(|(_, point)| filter.matches(&point.payload))
            .map(|(id, point)| ScoredPoint {
                id: id.clone(),
                score: cosine_similarity(&vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn scroll(&self, filter: &PayloadFilter) -> RAGResult<Vec<VectorPayload>> {
        let stored = self.points.read().await;
        Ok(stored
            .values()
            .filter(|point| filter.matches(&point.payload))
            .map(|point| point.payload.clone())
            .collect())
    }

    async fn delete(&self, filter: &PayloadFilter) -> RAGResult<()> {
        let mut stored = self.points.write().await;
        stored.retain(|_, point| !filter.matches(&point.payload));
        Ok(())
    }
}
