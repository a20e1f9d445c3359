use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use shared_models::{Side, Trade, TradeDetails};
use std::{collections::HashSet, path::Path};
use tracing::{info, warn};

/// 存储条目, 附带用于全文检索的小写 JSON 文本 (不含缺省字段)
#[derive(Debug, Clone)]
pub struct TradeEntry {
    pub trade: Trade,
    haystack: String,
}

impl TradeEntry {
    fn new(trade: Trade) -> Result<Self> {
        let mut rendered = serde_json::to_value(&trade)
            .with_context(|| format!("Failed to render trade {}", trade.trade_id))?;
        if let Value::Object(fields) = &mut rendered {
            fields.retain(|_, value| !value.is_null());
        }
        let haystack = rendered.to_string().to_lowercase();
        Ok(Self { trade, haystack })
    }

    /// needle 需已转为小写
    pub fn contains_text(&self, needle: &str) -> bool {
        self.haystack.contains(needle)
    }
}

/// 成交记录存储 (启动时构建, 运行期只读)
#[derive(Debug, Clone)]
pub struct TradeStore {
    entries: Vec<TradeEntry>,
}

impl TradeStore {
    pub fn new(trades: Vec<Trade>) -> Result<Self> {
        let mut seen = HashSet::new();
        for trade in &trades {
            if !seen.insert(trade.trade_id.as_str()) {
                warn!(trade_id = %trade.trade_id, "Duplicate trade id, lookups return the first match");
            }
        }

        let entries = trades
            .into_iter()
            .map(TradeEntry::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// 内置种子数据
    pub fn seeded() -> Result<Self> {
        let executed_at = NaiveDate::from_ymd_opt(2022, 1, 1)
            .and_then(|date| date.and_hms_opt(10, 30, 0))
            .context("Invalid seed timestamp")?;

        Self::new(vec![Trade::new(
            "1",
            "TSLA",
            "Tesla",
            "John Doe",
            executed_at,
            TradeDetails {
                buy_sell_indicator: Side::Buy,
                price: 100.0,
                quantity: 10,
            },
        )])
    }

    /// 从 JSON 数组文件加载
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let trades: Vec<Trade> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        info!("Loaded {} trades from {}", trades.len(), path.display());
        Self::new(trades)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TradeEntry> {
        self.entries.iter()
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.entries.iter().map(|entry| &entry.trade)
    }

    /// 半开区间 [start, end), 越界部分截断
    pub fn slice(&self, start: usize, end: usize) -> impl Iterator<Item = &Trade> {
        let end = end.min(self.entries.len());
        let start = start.min(end);
        self.entries[start..end].iter().map(|entry| &entry.trade)
    }

    /// 按 ID 查找, 重复 ID 返回第一条
    pub fn find_by_id(&self, trade_id: &str) -> Option<&Trade> {
        self.trades().find(|trade| trade.trade_id == trade_id)
    }
}
