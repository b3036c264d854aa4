//! Question answering over an ingested index: retrieval, then answer assembly.
pub mod answer;
pub mod generator;
pub mod retriever;

use std::sync::Arc;
use tracing::info;

use ragdocs_core::config::RagSettings;
use ragdocs_core::error::Result;
use ragdocs_core::traits::Generator;
use ragdocs_core::types::QaResponse;

pub use answer::AnswerAssembler;
pub use generator::OpenAiGenerator;
pub use retriever::Retriever;

/// The loaded question-answering pipeline shared by the chat REPL and the
/// HTTP server.
pub struct Rag {
    retriever: Retriever,
    assembler: AnswerAssembler,
}

impl Rag {
    pub fn new(retriever: Retriever, assembler: AnswerAssembler) -> Self {
        Self { retriever, assembler }
    }

    /// Build the embedder, open the index and configure generation from settings.
    pub async fn from_settings(settings: &RagSettings) -> Result<Self> {
        let embedder = ragdocs_embed::get_default_embedder(settings)?;
        let retriever = Retriever::from_settings(settings, embedder).await?;
        let generator = OpenAiGenerator::from_settings(settings).map(|g| {
            info!(model = g.model(), "LLM generation enabled");
            Arc::new(g) as Arc<dyn Generator>
        });
        if generator.is_none() {
            info!("No OpenAI API key configured; answers will be raw context");
        }
        Ok(Self::new(retriever, AnswerAssembler::new(generator)))
    }

    pub fn retriever(&self) -> &Retriever { &self.retriever }

    pub fn can_generate(&self) -> bool { self.assembler.can_generate() }

    pub async fn answer(&self, question: &str, top_k: usize, use_llm: bool) -> Result<QaResponse> {
        let retrieved = self.retriever.retrieve(question, top_k).await?;
        Ok(self.assembler.answer(question, retrieved, use_llm).await)
    }
}
