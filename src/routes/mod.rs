use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub mod periods;

/// Liveness endpoints, no state.
pub fn root() -> Router {
    Router::new()
        .route("/", get(|| async { Json::<Value>(json!({ "message": "Backend is running! 🚀" })) }))
        .route("/health", get(|| async { "✅ Backend up" }))
}
