use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 买卖方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// 线上格式: "BUY" / "SELL"
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(anyhow::anyhow!("Invalid side: {}", s)),
        }
    }
}

/// 成交明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDetails {
    /// BUY 为买入, SELL 为卖出
    pub buy_sell_indicator: Side,
    pub price: f64,
    /// 成交数量
    pub quantity: i64,
}

/// 成交记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// 资产类别
    #[serde(default)]
    pub asset_class: Option<String>,
    /// 交易对手
    #[serde(default)]
    pub counterparty: Option<String>,
    /// ISIN 或其他标的代码
    pub instrument_id: String,
    pub instrument_name: String,
    pub trade_date_time: NaiveDateTime,
    pub trade_details: TradeDetails,
    #[serde(default)]
    pub trade_id: String,
    pub trader: String,
}

impl Trade {
    pub fn new(
        trade_id: &str,
        instrument_id: &str,
        instrument_name: &str,
        trader: &str,
        trade_date_time: NaiveDateTime,
        trade_details: TradeDetails,
    ) -> Self {
        Self {
            asset_class: None,
            counterparty: None,
            instrument_id: instrument_id.to_string(),
            instrument_name: instrument_name.to_string(),
            trade_date_time,
            trade_details,
            trade_id: trade_id.to_string(),
            trader: trader.to_string(),
        }
    }

    pub fn with_asset_class(mut self, asset_class: &str) -> Self {
        self.asset_class = Some(asset_class.to_string());
        self
    }

    pub fn with_counterparty(mut self, counterparty: &str) -> Self {
        self.counterparty = Some(counterparty.to_string());
        self
    }

    pub fn price(&self) -> f64 {
        self.trade_details.price
    }

    pub fn side(&self) -> Side {
        self.trade_details.buy_sell_indicator
    }
}

/// 错误类型
#[derive(Debug, thiserror::Error)]
pub enum TradeError {
    #[error("Trade not found: {0}")]
    NotFound(String),
}

pub type TradeResult<T> = Result<T, TradeError>;
