use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ragdocs_core::traits::Embedder;
use ragdocs_core::types::Chunk;
use ragdocs_embed::FakeEmbedder;
use ragdocs_qa::{AnswerAssembler, Rag, Retriever};
use ragdocs_server::{app, ApiState};
use ragdocs_vector::{build_index, IndexWriter};

const INDEX_MODEL: &str = "fake-index-model";

fn corpus() -> Vec<Chunk> {
    [
        ("rust ownership and borrowing rules", "rust.pdf"),
        ("sourdough needs a mature starter", "bread.pdf"),
        ("the sky is blue because of rayleigh scattering", "sky.pdf"),
    ]
    .into_iter()
    .map(|(text, source)| Chunk { text: text.into(), source: source.into(), position: 0 })
    .collect()
}

/// An app whose index was built with `INDEX_MODEL` and is queried with `query_model`.
async fn test_app(tmp: &TempDir, query_model: &str) -> Router {
    let index_path = tmp.path().join("lancedb");
    let meta_path = tmp.path().join("metadata.json");
    let writer = IndexWriter::new(&index_path, &meta_path);
    build_index(&corpus(), &FakeEmbedder::new(INDEX_MODEL, 64), &writer).await.expect("build index");

    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(query_model, 64));
    let retriever = Retriever::load(&index_path, &meta_path, embedder).await.expect("load");
    app(ApiState::new(Rag::new(retriever, AnswerAssembler::new(None)), 4))
}

async fn post_qa(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/qa")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn root_returns_greeting() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    let response = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn answers_with_sources() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    let (status, body) = post_qa(app, json!({"question": "sourdough needs a mature starter", "top_k": 2, "use_llm": false})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "sourdough needs a mature starter");
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0]["source"], "bread.pdf");
    assert!(sources[0]["score"].is_number());
    assert!(body["answer"].as_str().unwrap().starts_with("sourdough needs a mature starter"));
}

#[tokio::test]
async fn question_is_echoed_as_sent() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    let (status, body) = post_qa(app, json!({"question": "  why is the sky blue?\n", "use_llm": false})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "  why is the sky blue?\n");
}

#[tokio::test]
async fn defaults_apply_when_fields_omitted() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    // no generator configured, so use_llm defaulting to true still yields raw context
    let (status, body) = post_qa(app, json!({"question": "why is the sky blue"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    let (status, body) = post_qa(app, json!({"question": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, INDEX_MODEL).await;
    let (status, body) = post_qa(app, json!({"question": "rust", "top_k": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("top_k"));
}

#[tokio::test]
async fn model_mismatch_is_a_conflict() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, "some-other-model").await;
    let (status, body) = post_qa(app, json!({"question": "rust", "use_llm": false})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains(INDEX_MODEL));
}

#[tokio::test]
async fn unloaded_index_degrades_to_placeholder() {
    let tmp = TempDir::new().unwrap();
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(INDEX_MODEL, 64));
    let retriever = Retriever::load(&tmp.path().join("missing"), &tmp.path().join("missing.json"), embedder).await.unwrap();
    let app = app(ApiState::new(Rag::new(retriever, AnswerAssembler::new(None)), 4));

    let (status, body) = post_qa(app, json!({"question": "anything"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "No context retrieved.");
    assert_eq!(body["sources"], json!([]));
}
