use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use ragdocs_core::types::QaResponse;

use crate::{error::ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: String,
    /// Falls back to the configured default (4) when omitted.
    pub top_k: Option<usize>,
    #[serde(default = "default_use_llm")]
    pub use_llm: bool,
}

fn default_use_llm() -> bool { true }

pub async fn answer_question(
    State(state): State<ApiState>,
    Json(request): Json<QaRequest>,
) -> Result<Json<QaResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::ValidationError("question must not be empty".to_string()));
    }
    let top_k = request.top_k.unwrap_or(state.default_top_k);
    if top_k == 0 {
        return Err(ApiError::ValidationError("top_k must be positive".to_string()));
    }

    let response = state.rag.answer(&request.question, top_k, request.use_llm).await?;
    info!(top_k, sources = response.sources.len(), use_llm = request.use_llm, "Answered question");
    Ok(Json(response))
}
