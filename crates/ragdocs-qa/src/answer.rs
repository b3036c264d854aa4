//! Turns retrieved chunks into an answer, with or without a language model.
use std::sync::Arc;
use tracing::warn;

use ragdocs_core::traits::Generator;
use ragdocs_core::types::{QaResponse, QueryResult};

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
pub const FALLBACK_ANSWER_CHARS: usize = 2000;
pub const NO_CONTEXT_ANSWER: &str = "No context retrieved.";

pub fn build_context(results: &[QueryResult]) -> String {
    results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the context below to answer the question. If the answer is not in the context, say 'I don't know'.\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

/// At most `max_chars` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

pub struct AnswerAssembler {
    generator: Option<Arc<dyn Generator>>,
}

impl AnswerAssembler {
    pub fn new(generator: Option<Arc<dyn Generator>>) -> Self { Self { generator } }

    pub fn can_generate(&self) -> bool { self.generator.is_some() }

    /// Generation is attempted only when asked for and a generator is configured.
    /// Generator failures become the answer text instead of an error.
    pub async fn answer(&self, question: &str, retrieved: Vec<QueryResult>, use_llm: bool) -> QaResponse {
        let context = build_context(&retrieved);
        let answer = match (&self.generator, use_llm) {
            (Some(generator), true) => match generator.generate(&build_prompt(&context, question)).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Generation failed");
                    format!("OpenAI call failed: {e}")
                }
            },
            _ if context.is_empty() => NO_CONTEXT_ANSWER.to_string(),
            _ => truncate_chars(&context, FALLBACK_ANSWER_CHARS).to_string(),
        };
        QaResponse { question: question.to_string(), answer, sources: retrieved }
    }
}
