// Local sentence embeddings: BERT-family models from the Hugging Face hub run with candle

use super::embedding::EmbeddingService;
use crate::rag::{RAGError, RAGResult};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Token limit per input, matching sentence-transformers' MiniLM default
const MAX_SEQUENCE_LENGTH: usize = 256;

fn candle_error(e: candle_core::Error) -> RAGError {
    RAGError::Embedding(format!("Candle error: {}", e))
}

pub struct LocalEmbeddingService {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    model_name: String,
    dimensions: usize,
    batch_size: usize,
}

impl LocalEmbeddingService {
    /// Download (or reuse the cached copy of) `model_id` and load it on the CPU
    pub async fn load(model_id: &str, dimensions: usize, batch_size: usize) -> RAGResult<Self> {
        let id = model_id.to_string();
        let (model, tokenizer, device) = tokio::task::spawn_blocking(move || Self::load_blocking(&id))
            .await
            .map_err(|e| RAGError::Embedding(format!("Task join error: {}", e)))??;

        tracing::info!("Loaded local embedding model {}", model_id);

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            model_name: model_id.to_string(),
            dimensions,
            batch_size,
        })
    }

    fn load_blocking(model_id: &str) -> RAGResult<(BertModel, Tokenizer, Device)> {
        let device = Device::Cpu;

        let api = Api::new()
            .map_err(|e| RAGError::Embedding(format!("Failed to initialise model hub: {}", e)))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));
        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                RAGError::Embedding(format!("Failed to fetch {} for {}: {}", file, model_id, e))
            })
        };

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_json = std::fs::read_to_string(&config_path)
            .map_err(|e| RAGError::Embedding(format!("Failed to read model config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_json)
            .map_err(|e| RAGError::Embedding(format!("Invalid model config: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| RAGError::Embedding(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| RAGError::Embedding(format!("Failed to configure tokenizer: {}", e)))?;

        // SAFETY: the weights file is owned by the hub cache and not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(candle_error)?;
        let model = BertModel::load(vb, &config).map_err(candle_error)?;

        Ok((model, tokenizer, device))
    }

    /// Mean-pool token embeddings under the attention mask, then L2-normalise
    fn encode(
        model: &BertModel,
        tokenizer: &Tokenizer,
        device: &Device,
        texts: Vec<String>,
    ) -> RAGResult<Vec<Vec<f32>>> {
        let encodings = tokenizer
            .encode_batch(texts, true)
            .map_err(|e| RAGError::Embedding(format!("Tokenization failed: {}", e)))?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(candle_error)?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(candle_error)?;

        let pooled = (|| -> candle_core::Result<Vec<Vec<f32>>> {
            let input_ids = Tensor::stack(&ids, 0)?;
            let attention_mask = Tensor::stack(&masks, 0)?;
            let token_type_ids = input_ids.zeros_like()?;

            let hidden = model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

            let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
            let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
            let counts = mask.sum(1)?;
            let mean = summed.broadcast_div(&counts)?;
            let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?;
            mean.broadcast_div(&norms)?.to_vec2::<f32>()
        })()
        .map_err(candle_error)?;

        Ok(pooled)
    }
}

#[async_trait]
impl EmbeddingService for LocalEmbeddingService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch_raw(&self, texts: &[String]) -> RAGResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let tokenizer = Arc::clone(&self.tokenizer);
        let device = self.device.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || Self::encode(&model, &tokenizer, &device, texts))
            .await
            .map_err(|e| RAGError::Embedding(format!("Task join error: {}", e)))?
    }
}
