//! Sentence embeddings on candle.
//!
//! `SentenceEmbedder` runs a BERT-family sentence-transformers checkpoint
//! (e.g. `all-MiniLM-L6-v2`) from a local model directory and mean-pools the
//! last hidden state into L2-normalised vectors. `FakeEmbedder` is a
//! deterministic token-hashing stand-in for tests and offline development.
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use ragdocs_core::config::{resolve_with_base, RagSettings};
use ragdocs_core::traits::Embedder;

pub mod device;
mod pool;
mod tokenize;

pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

/// Dimension of `FakeEmbedder` vectors; matches MiniLM so indexes look alike.
pub const FAKE_DIM: usize = 384;
const MAX_SEQ_LEN: usize = 256;
const INFER_BATCH: usize = 32;

#[derive(Deserialize)]
struct ModelShape {
    hidden_size: usize,
    max_position_embeddings: usize,
}

pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, model_id: String, dim: usize, max_len: usize, pad_id: u32 }

impl SentenceEmbedder {
    /// Load `config.json`, `tokenizer.json` and `model.safetensors`
    /// (or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, model_id: &str, device: Device) -> Result<Self> {
        info!(model = model_id, dir = %model_dir.display(), "Loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let shape: ModelShape = serde_json::from_str(&raw_config)?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DTYPE, &device);
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        info!(model = model_id, dim = shape.hidden_size, "Embedding model loaded");
        Ok(Self { model, tokenizer, device, model_id: model_id.to_string(), dim: shape.hidden_size, max_len: shape.max_position_embeddings.min(MAX_SEQ_LEN), pad_id })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

impl Embedder for SentenceEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(INFER_BATCH) { out.extend(self.embed_chunk(batch)?); }
        debug!(count = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Embedded batch");
        Ok(out)
    }
}

pub struct FakeEmbedder { model_id: String, dim: usize }

impl FakeEmbedder {
    pub fn new(model_id: &str, dim: usize) -> Self { Self { model_id: model_id.to_string(), dim } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        let tokens = text.split_whitespace().map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()).filter(|t| !t.is_empty());
        for (i, token) in tokens.enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { MAX_SEQ_LEN }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

/// Build the embedder named by `settings.embed_model`.
///
/// `fake_embeddings = true` (`RAG_FAKE_EMBEDDINGS=1`) switches to the
/// `FakeEmbedder` under the id `fake:<embed_model>`, so an index built with it
/// is refused by the real model and vice versa.
pub fn get_default_embedder(settings: &RagSettings) -> Result<Arc<dyn Embedder>> {
    if settings.fake_embeddings {
        info!(model = %settings.embed_model, "Using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(&fake_model_id(&settings.embed_model), FAKE_DIM)));
    }
    let model_dir = resolve_model_dir(settings)?;
    let device = device::select_device(&settings.device);
    Ok(Arc::new(SentenceEmbedder::load(&model_dir, &settings.embed_model, device)?))
}

pub fn fake_model_id(embed_model: &str) -> String { format!("fake:{embed_model}") }

/// `<models_dir>/<embed_model>`, or `embed_model` itself when it is a path.
pub fn resolve_model_dir(settings: &RagSettings) -> Result<PathBuf> {
    let dir = resolve_with_base(&settings.models_dir, &settings.embed_model);
    if dir.join("config.json").exists() {
        return Ok(dir);
    }
    Err(anyhow!("Could not locate model '{}' (looked in {})", settings.embed_model, dir.display()))
}
