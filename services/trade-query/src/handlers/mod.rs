use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared_models::TradeError;
use shared_protocols::{ApiError as ErrorBody, ApiResponse};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{metrics_middleware, request_id_middleware},
    state::AppState,
};

pub mod error;
pub mod health;
pub mod trades;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // 健康检查
        .route("/health", get(health::health_check))
        // 成交查询
        .route("/trades", get(trades::list_trades))
        .route("/trades/search", get(trades::search_trades))
        .route("/trades/filter", get(trades::filter_trades))
        .route("/trades/:trade_id", get(trades::get_trade))
}

/// 组装路由与中间件
pub fn create_app(state: AppState) -> Router {
    let mut router = create_routes().fallback(error::handle_404);

    if state.config.monitoring.enabled {
        router = router
            .route("/metrics", get(health::metrics))
            .layer(from_fn_with_state(state.clone(), metrics_middleware));
    }

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(from_fn(request_id_middleware));

    router.layer(middleware).with_state(state)
}

/// API错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// 转换为HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::TradeNotFound(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::TradeNotFound(_) | ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
        }
    }

    fn body(&self) -> ErrorBody {
        let body = ErrorBody::new(self.code(), &self.to_string());
        match self {
            ApiError::TradeNotFound(trade_id) => body.with_details(json!({ "tradeId": trade_id })),
            _ => body,
        }
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        match err {
            TradeError::NotFound(trade_id) => ApiError::TradeNotFound(trade_id),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ApiResponse::<()>::error(self.body());
        (self.status_code(), Json(response)).into_response()
    }
}
