use axum::response::{IntoResponse, Response};

use super::ApiError;

/// 404处理器
pub async fn handle_404() -> Response {
    ApiError::NotFound("Endpoint not found".to_string()).into_response()
}
