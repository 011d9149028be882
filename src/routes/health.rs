use axum::{http::StatusCode, response::IntoResponse, Json};

// Liveness endpoint - fixed body, no auth
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" })))
}

// Welcome route for the API root
pub async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to the StudyShelf API" }))
}
