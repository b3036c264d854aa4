use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn greeting() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"message": "ragdocs is running. POST a question to /qa."})))
}
