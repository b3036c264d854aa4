use async_trait::async_trait;

pub trait Embedder: Send + Sync {
    /// Stable identifier of the model that produced the vectors.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Text generation backend used to turn retrieved context into an answer.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
