use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared_models::{Trade, TradeError, TradeResult};
use std::sync::Arc;

use crate::storage::{TradeEntry, TradeStore};

/// 多个查询条件的组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// 任一条件命中即返回; 未提供任何条件时不返回记录
    #[default]
    Any,
    /// 所有条件均命中才返回; 未提供任何条件时返回全部记录
    All,
}

impl MatchMode {
    /// None 表示该条件未提供, 不参与组合
    pub fn combine<I>(self, checks: I) -> bool
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        let mut supplied = checks.into_iter().flatten();
        match self {
            MatchMode::Any => supplied.any(|matched| matched),
            MatchMode::All => supplied.all(|matched| matched),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Any => write!(f, "any"),
            MatchMode::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            _ => Err(anyhow::anyhow!("Invalid match mode: {} (expected any or all)", s)),
        }
    }
}

/// 空字符串视为未提供
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 搜索条件
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    /// 已转为小写
    search: Option<String>,
    counterparty: Option<String>,
    instrument_id: Option<String>,
    instrument_name: Option<String>,
    trader: Option<String>,
}

impl SearchCriteria {
    pub fn new(
        search: Option<String>,
        counterparty: Option<String>,
        instrument_id: Option<String>,
        instrument_name: Option<String>,
        trader: Option<String>,
    ) -> Self {
        Self {
            search: non_empty(search).map(|s| s.to_lowercase()),
            counterparty: non_empty(counterparty),
            instrument_id: non_empty(instrument_id),
            instrument_name: non_empty(instrument_name),
            trader: non_empty(trader),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.counterparty.is_none()
            && self.instrument_id.is_none()
            && self.instrument_name.is_none()
            && self.trader.is_none()
    }

    fn matches(&self, entry: &TradeEntry, mode: MatchMode) -> bool {
        let trade = &entry.trade;
        mode.combine([
            self.search.as_deref().map(|needle| entry.contains_text(needle)),
            self.counterparty
                .as_deref()
                .map(|v| trade.counterparty.as_deref() == Some(v)),
            self.instrument_id.as_deref().map(|v| trade.instrument_id == v),
            self.instrument_name.as_deref().map(|v| trade.instrument_name == v),
            self.trader.as_deref().map(|v| trade.trader == v),
        ])
    }
}

/// 过滤条件
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub asset_class: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// 与 buySellIndicator 的线上值精确比较
    pub trade_type: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.asset_class.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.trade_type.is_none()
    }

    fn matches(&self, trade: &Trade, mode: MatchMode) -> bool {
        let executed_at = trade.trade_date_time;
        let price = trade.price();
        mode.combine([
            self.asset_class
                .as_deref()
                .map(|v| trade.asset_class.as_deref() == Some(v)),
            self.start.map(|start| executed_at >= start),
            self.end.map(|end| executed_at <= end),
            self.min_price.map(|min| price >= min),
            self.max_price.map(|max| price <= max),
            self.trade_type.as_deref().map(|v| trade.side().as_str() == v),
        ])
    }
}

/// 解析查询参数中的时间: 无时区 ISO-8601, RFC 3339 (转为 UTC), 或纯日期
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.naive_utc());
    }

    // 未编码的 '+' 在查询串中会被解码为空格
    if let Some((datetime, offset)) = raw.rsplit_once(' ') {
        if datetime.contains('T') {
            let repaired = format!("{}+{}", datetime, offset);
            if let Ok(timestamp) = DateTime::parse_from_rfc3339(&repaired) {
                return Ok(timestamp.naive_utc());
            }
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(timestamp);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {}", raw))
}

/// 成交查询服务
#[derive(Clone)]
pub struct TradeQueryService {
    trade_store: Arc<TradeStore>,
}

impl TradeQueryService {
    pub fn new(trade_store: Arc<TradeStore>) -> Self {
        Self { trade_store }
    }

    /// 分页查询, page 从 1 开始
    pub fn list(&self, page: usize, size: usize) -> Vec<Trade> {
        let start = page.saturating_sub(1).saturating_mul(size);
        let end = start.saturating_add(size);
        self.trade_store.slice(start, end).cloned().collect()
    }

    /// 按 ID 查询
    pub fn get(&self, trade_id: &str) -> TradeResult<Trade> {
        self.trade_store
            .find_by_id(trade_id)
            .cloned()
            .ok_or_else(|| TradeError::NotFound(trade_id.to_string()))
    }

    /// 全文/字段搜索, 保持存储顺序
    pub fn search(&self, criteria: &SearchCriteria, mode: MatchMode) -> Vec<Trade> {
        self.trade_store
            .entries()
            .filter(|entry| criteria.matches(entry, mode))
            .map(|entry| entry.trade.clone())
            .collect()
    }

    /// 区间过滤, 保持存储顺序
    pub fn filter(&self, criteria: &FilterCriteria, mode: MatchMode) -> Vec<Trade> {
        self.trade_store
            .trades()
            .filter(|trade| criteria.matches(trade, mode))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared_models::{Side, TradeDetails};

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn trade(id: &str, trader: &str, side: Side, price: f64, executed_at: NaiveDateTime) -> Trade {
        Trade::new(
            id,
            &format!("INS{}", id),
            &format!("Instrument {}", id),
            trader,
            executed_at,
            TradeDetails {
                buy_sell_indicator: side,
                price,
                quantity: 1,
            },
        )
    }

    fn service() -> TradeQueryService {
        let trades = vec![
            trade("1", "John Doe", Side::Buy, 100.0, at(2022, 1, 1, 10)).with_asset_class("Equity"),
            trade("2", "Jane Roe", Side::Sell, 50.0, at(2022, 3, 1, 9))
                .with_asset_class("Bond")
                .with_counterparty("Goldman"),
            trade("3", "John Doe", Side::Sell, 250.0, at(2022, 6, 1, 15)).with_asset_class("FX"),
            trade("4", "Ann Lee", Side::Buy, 75.0, at(2022, 9, 1, 11)).with_asset_class("Equity"),
        ];
        TradeQueryService::new(Arc::new(TradeStore::new(trades).unwrap()))
    }

    fn ids(trades: &[Trade]) -> Vec<&str> {
        trades.iter().map(|t| t.trade_id.as_str()).collect()
    }

    #[test]
    fn test_combine_modes() {
        assert!(MatchMode::Any.combine([None, Some(false), Some(true)]));
        assert!(!MatchMode::Any.combine([None, Some(false)]));
        assert!(!MatchMode::Any.combine([None, None]));

        assert!(MatchMode::All.combine([None, Some(true), Some(true)]));
        assert!(!MatchMode::All.combine([Some(true), Some(false)]));
        assert!(MatchMode::All.combine([None, None]));
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("ANY".parse::<MatchMode>().unwrap(), MatchMode::Any);
        assert_eq!("all".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert!("both".parse::<MatchMode>().is_err());
        assert_eq!(MatchMode::default(), MatchMode::Any);
    }

    #[test]
    fn test_list_pages_are_prefix_consistent() {
        let trades: Vec<Trade> = (1..=23)
            .map(|i| trade(&i.to_string(), "T", Side::Buy, i as f64, at(2022, 1, 1, 0)))
            .collect();
        let service = TradeQueryService::new(Arc::new(TradeStore::new(trades.clone()).unwrap()));

        for size in [1, 4, 10, 30] {
            let mut collected = Vec::new();
            for page in 1..=4 {
                let chunk = service.list(page, size);
                assert!(chunk.len() <= size);
                collected.extend(chunk);
                let expected = (page * size).min(trades.len());
                assert_eq!(collected, trades[..expected].to_vec());
            }
        }
    }

    #[test]
    fn test_list_out_of_range_is_empty() {
        let service = service();
        assert!(service.list(3, 10).is_empty());
        assert!(service.list(usize::MAX, usize::MAX).is_empty());
        assert_eq!(ids(&service.list(2, 3)), vec!["4"]);
    }

    #[test]
    fn test_get_by_id() {
        let service = service();
        assert_eq!(service.get("3").unwrap().trader, "John Doe");

        match service.get("nonexistent") {
            Err(TradeError::NotFound(id)) => assert_eq!(id, "nonexistent"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_search_by_trader_includes_every_match() {
        let service = service();
        let criteria = SearchCriteria::new(None, None, None, None, Some("John Doe".to_string()));
        assert_eq!(ids(&service.search(&criteria, MatchMode::Any)), vec!["1", "3"]);
    }

    #[test]
    fn test_search_free_text_is_case_insensitive() {
        let service = service();
        let criteria = SearchCriteria::new(Some("GOLDMAN".to_string()), None, None, None, None);
        assert_eq!(ids(&service.search(&criteria, MatchMode::Any)), vec!["2"]);

        let criteria = SearchCriteria::new(Some("instrument 4".to_string()), None, None, None, None);
        assert_eq!(ids(&service.search(&criteria, MatchMode::Any)), vec!["4"]);
    }

    #[test]
    fn test_search_combination_policy() {
        let service = service();
        let criteria = SearchCriteria::new(
            None,
            Some("Goldman".to_string()),
            None,
            None,
            Some("Ann Lee".to_string()),
        );

        assert_eq!(ids(&service.search(&criteria, MatchMode::Any)), vec!["2", "4"]);
        assert!(service.search(&criteria, MatchMode::All).is_empty());

        let narrowing = SearchCriteria::new(
            None,
            None,
            Some("INS3".to_string()),
            None,
            Some("John Doe".to_string()),
        );
        assert_eq!(ids(&service.search(&narrowing, MatchMode::All)), vec!["3"]);
    }

    #[test]
    fn test_search_empty_strings_are_ignored() {
        let service = service();
        let criteria = SearchCriteria::new(Some(String::new()), None, None, None, Some(String::new()));

        assert!(criteria.is_empty());
        assert!(service.search(&criteria, MatchMode::Any).is_empty());
        assert_eq!(service.search(&criteria, MatchMode::All).len(), 4);
    }

    #[test]
    fn test_filter_by_trade_type() {
        let service = service();
        let criteria = FilterCriteria {
            trade_type: Some("BUY".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&criteria, MatchMode::Any)), vec!["1", "4"]);

        let lowercase = FilterCriteria {
            trade_type: Some("buy".to_string()),
            ..Default::default()
        };
        assert!(service.filter(&lowercase, MatchMode::Any).is_empty());
    }

    #[test]
    fn test_filter_disjoint_criteria_return_union() {
        let service = service();
        let criteria = FilterCriteria {
            asset_class: Some("Bond".to_string()),
            trade_type: Some("BUY".to_string()),
            ..Default::default()
        };

        assert_eq!(ids(&service.filter(&criteria, MatchMode::Any)), vec!["1", "2", "4"]);
        assert!(service.filter(&criteria, MatchMode::All).is_empty());
    }

    #[test]
    fn test_filter_price_bounds() {
        let service = service();
        let min_only = FilterCriteria {
            min_price: Some(100.0),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&min_only, MatchMode::Any)), vec!["1", "3"]);

        let max_only = FilterCriteria {
            max_price: Some(75.0),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&max_only, MatchMode::Any)), vec!["2", "4"]);

        let range = FilterCriteria {
            min_price: Some(60.0),
            max_price: Some(120.0),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&range, MatchMode::All)), vec!["1", "4"]);
        // 任一模式下上下界各自独立判断
        assert_eq!(service.filter(&range, MatchMode::Any).len(), 4);
    }

    #[test]
    fn test_filter_time_window() {
        let service = service();
        let window = FilterCriteria {
            start: Some(at(2022, 2, 1, 0)),
            end: Some(at(2022, 6, 1, 15)),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&window, MatchMode::All)), vec!["2", "3"]);

        let start_only = FilterCriteria {
            start: Some(at(2022, 6, 1, 15)),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&start_only, MatchMode::Any)), vec!["3", "4"]);

        let end_only = FilterCriteria {
            end: Some(at(2022, 3, 1, 9)),
            ..Default::default()
        };
        assert_eq!(ids(&service.filter(&end_only, MatchMode::Any)), vec!["1", "2"]);
    }

    #[test]
    fn test_filter_without_criteria() {
        let service = service();
        let criteria = FilterCriteria::default();

        assert!(criteria.is_empty());
        assert!(service.filter(&criteria, MatchMode::Any).is_empty());
        assert_eq!(service.filter(&criteria, MatchMode::All).len(), 4);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = at(2022, 1, 1, 10);

        assert_eq!(parse_timestamp("2022-01-01T10:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01 10:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01T10:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01T12:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01T12:00:00 02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-01-01").unwrap(), at(2022, 1, 1, 0));

        let fractional = parse_timestamp("2022-01-01T10:00:00.500").unwrap();
        assert!(fractional > expected);

        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2022-13-01").is_err());
    }
}
