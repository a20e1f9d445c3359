use anyhow::Result;
use shared_utils::AppMetrics;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{config::TradeQueryConfig, services::TradeQueryService, storage::TradeStore};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: TradeQueryConfig,
    pub metrics: Arc<AppMetrics>,

    // 存储层
    pub trade_store: Arc<TradeStore>,

    // 服务层
    pub trade_service: Arc<TradeQueryService>,
}

impl AppState {
    pub fn new(config: TradeQueryConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let trade_store = match &config.store.seed_path {
            Some(path) => TradeStore::from_json_file(path)?,
            None => TradeStore::seeded()?,
        };
        if trade_store.is_empty() {
            warn!("Trade store is empty, every query will return no trades");
        } else {
            info!("Trade store ready with {} trades", trade_store.len());
        }

        Ok(Self::with_store(config, metrics, trade_store))
    }

    pub fn with_store(config: TradeQueryConfig, metrics: Arc<AppMetrics>, trade_store: TradeStore) -> Self {
        let trade_store = Arc::new(trade_store);
        let trade_service = Arc::new(TradeQueryService::new(trade_store.clone()));

        Self {
            config,
            metrics,
            trade_store,
            trade_service,
        }
    }
}
