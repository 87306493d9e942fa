//! Service entry points outside the book collection.

use axum::Json;
use serde_json::{json, Value};

/// GET / - Welcome message with pointers to the main routes.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Books API",
        "books": "/api/books",
        "stats": "/api/books/stats",
        "health": "/health"
    }))
}

/// GET /health - Liveness check.
pub async fn health_check() -> &'static str {
    "OK"
}
