use std::sync::Arc;

use anyhow::Context;

use crate::auth::{AuthConfig, AuthService};
use crate::config::{EmbeddingProvider, Settings, StorageBackend};
use crate::database::{self, InMemoryUserRepository, MongoUserRepository, UserRepository};
use crate::rag::engines::{QdrantStore, SimpleVectorStore};
use crate::rag::processors::ChunkingOptions;
use crate::rag::services::OpenAICompatibleEmbeddingService;
use crate::rag::{DocumentService, EmbeddingService, VectorStore};
use crate::services::UserService;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: AuthService,
    pub documents: DocumentService,
}

impl AppState {
    pub fn new(
        settings: Settings,
        user_repository: Arc<dyn UserRepository>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> anyhow::Result<Self> {
        let chunking = ChunkingOptions::new(settings.chunk_size, settings.overlap)?;
        let users = UserService::new(user_repository, settings.bcrypt_cost);
        let auth = AuthService::new(AuthConfig::from(&settings), users);
        let documents = DocumentService::new(embedder, vector_store, chunking);

        Ok(Self {
            settings: Arc::new(settings),
            auth,
            documents,
        })
    }

    /// Build the configured storage backends and embedding provider
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let embedder = create_embedder(&settings).await?;

        let user_repository: Arc<dyn UserRepository>;
        let vector_store: Arc<dyn VectorStore>;
        match settings.storage_backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                user_repository = Arc::new(InMemoryUserRepository::new());
                vector_store = Arc::new(SimpleVectorStore::new(settings.vector_size));
            }
            StorageBackend::External => {
                let collection = database::connect_users_collection(&settings)
                    .await
                    .context("Failed to initialize MongoDB")?;
                let store = QdrantStore::new(
                    &settings.qdrant_url,
                    settings.qdrant_api_key.clone(),
                    &settings.documents_collection,
                    settings.vector_size,
                )?;
                if let Err(e) = store.ensure_collection().await {
                    tracing::warn!(
                        "Qdrant collection {} is not ready yet: {}",
                        settings.documents_collection,
                        e
                    );
                }
                user_repository = Arc::new(MongoUserRepository::new(collection));
                vector_store = Arc::new(store);
            }
        }

        Self::new(settings, user_repository, vector_store, embedder)
    }
}

async fn create_embedder(settings: &Settings) -> anyhow::Result<Arc<dyn EmbeddingService>> {
    match settings.embedding_provider {
        EmbeddingProvider::OpenAI => {
            tracing::info!(
                "Using embedding model {} at {}",
                settings.embedding_model,
                settings.embedding_api_url
            );
            Ok(Arc::new(OpenAICompatibleEmbeddingService::new(
                &settings.embedding_api_url,
                settings.embedding_api_key.clone(),
                &settings.embedding_model,
                settings.vector_size,
                settings.embedding_batch_size,
            )?))
        }
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Local => {
            let service = crate::rag::services::LocalEmbeddingService::load(
                &settings.embedding_model,
                settings.vector_size,
                settings.embedding_batch_size,
            )
            .await
            .with_context(|| format!("Failed to load embedding model {}", settings.embedding_model))?;
            Ok(Arc::new(service))
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Local => anyhow::bail!(
            "EMBEDDING_PROVIDER=local requires the local-embeddings feature; rebuild with it or use openai"
        ),
    }
}
