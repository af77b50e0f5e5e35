use axum::http::{StatusCode, Uri};

use crate::error::AppError;

pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
