//! HTTP surface for question answering.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use ragdocs_qa::Rag;
use routes::{qa::answer_question, root::greeting};

pub mod error;
mod routes;

pub use routes::qa::QaRequest;

#[derive(Clone)]
pub struct ApiState {
    pub rag: Arc<Rag>,
    pub default_top_k: usize,
}

impl ApiState {
    pub fn new(rag: Rag, default_top_k: usize) -> Self {
        Self { rag: Arc::new(rag), default_top_k }
    }
}

pub fn app(state: ApiState) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/qa", post(answer_question))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
