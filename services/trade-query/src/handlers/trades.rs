use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde::Deserialize;
use shared_models::Trade;
use tracing::{debug, info, warn};

use super::ApiError;
use crate::{
    config::QueryConfig,
    services::{parse_timestamp, FilterCriteria, MatchMode, SearchCriteria},
    state::AppState,
};

/// 分页参数
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PaginationParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    pub fn size(&self, config: &QueryConfig) -> usize {
        self.size.unwrap_or(config.default_page_size)
    }

    /// 验证参数
    pub fn validate(&self, config: &QueryConfig) -> Result<(), ApiError> {
        if self.page() == 0 {
            return Err(ApiError::BadRequest("page must be greater than 0".to_string()));
        }

        let size = self.size(config);
        if size == 0 {
            return Err(ApiError::BadRequest("size must be greater than 0".to_string()));
        }
        if let Some(max_page_size) = config.max_page_size {
            if size > max_page_size {
                return Err(ApiError::BadRequest(format!(
                    "size cannot exceed {}",
                    max_page_size
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTradesQuery {
    pub search: Option<String>,
    pub counterparty: Option<String>,
    pub instrument_id: Option<String>,
    pub instrument_name: Option<String>,
    pub trader: Option<String>,
    pub match_mode: Option<String>,
}

impl SearchTradesQuery {
    fn into_criteria(self) -> SearchCriteria {
        SearchCriteria::new(
            self.search,
            self.counterparty,
            self.instrument_id,
            self.instrument_name,
            self.trader,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTradesQuery {
    pub asset_class: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub trade_type: Option<String>,
    pub match_mode: Option<String>,
}

impl FilterTradesQuery {
    fn into_criteria(self) -> Result<FilterCriteria, ApiError> {
        Ok(FilterCriteria {
            asset_class: self.asset_class.filter(|v| !v.is_empty()),
            start: timestamp_param("start", self.start)?,
            end: timestamp_param("end", self.end)?,
            min_price: price_param("minPrice", self.min_price)?,
            max_price: price_param("maxPrice", self.max_price)?,
            trade_type: self.trade_type.filter(|v| !v.is_empty()),
        })
    }
}

fn timestamp_param(
    name: &str,
    raw: Option<String>,
) -> Result<Option<chrono::NaiveDateTime>, ApiError> {
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_timestamp(value)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("{}: {}", name, e))),
        None => Ok(None),
    }
}

fn price_param(name: &str, value: Option<f64>) -> Result<Option<f64>, ApiError> {
    match value {
        Some(price) if !price.is_finite() => Err(ApiError::BadRequest(format!(
            "{} must be a finite number",
            name
        ))),
        other => Ok(other),
    }
}

/// 请求中的 matchMode 优先于配置
fn resolve_match_mode(raw: Option<&str>, default: MatchMode) -> Result<MatchMode, ApiError> {
    match raw.filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse::<MatchMode>()
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        None => Ok(default),
    }
}

/// 分页查询成交列表
pub async fn list_trades(
    State(state): State<AppState>,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let Query(params) = query?;
    params.validate(&state.config.query).map_err(|e| {
        warn!("Rejected list request: {}", e);
        e
    })?;

    let page = params.page();
    let size = params.size(&state.config.query);
    let trades = state.trade_service.list(page, size);

    debug!(page, size, returned = trades.len(), "Listed trades");
    state.metrics.record_query_result("list", trades.len());

    Ok(Json(trades))
}

/// 按 ID 查询成交
pub async fn get_trade(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Trade>, ApiError> {
    let Path(trade_id) = path.map_err(|e| {
        warn!("Rejected trade lookup: {}", e.body_text());
        ApiError::from(e)
    })?;
    match state.trade_service.get(&trade_id) {
        Ok(trade) => {
            debug!(trade_id = %trade_id, "Trade found");
            Ok(Json(trade))
        }
        Err(e) => {
            info!(trade_id = %trade_id, "Trade lookup missed");
            Err(e.into())
        }
    }
}

/// 全文/字段搜索
pub async fn search_trades(
    State(state): State<AppState>,
    query: Result<Query<SearchTradesQuery>, QueryRejection>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let Query(query) = query?;
    let mode = resolve_match_mode(query.match_mode.as_deref(), state.config.query.match_mode)?;
    let criteria = query.into_criteria();
    if criteria.is_empty() {
        debug!(mode = %mode, "Search without criteria");
    }

    let trades = state.trade_service.search(&criteria, mode);

    debug!(mode = %mode, returned = trades.len(), "Searched trades");
    state.metrics.record_query_result("search", trades.len());

    Ok(Json(trades))
}

/// 区间过滤
pub async fn filter_trades(
    State(state): State<AppState>,
    query: Result<Query<FilterTradesQuery>, QueryRejection>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let Query(query) = query?;
    let mode = resolve_match_mode(query.match_mode.as_deref(), state.config.query.match_mode)?;
    let criteria = query.into_criteria().map_err(|e| {
        warn!("Rejected filter request: {}", e);
        e
    })?;
    if criteria.is_empty() {
        debug!(mode = %mode, "Filter without criteria");
    }

    let trades = state.trade_service.filter(&criteria, mode);

    debug!(mode = %mode, returned = trades.len(), "Filtered trades");
    state.metrics.record_query_result("filter", trades.len());

    Ok(Json(trades))
}
