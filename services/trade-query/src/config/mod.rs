use anyhow::Result;
use serde::{Deserialize, Serialize};
use shared_utils::LoggingSettings;

use crate::services::MatchMode;

/// 成交查询服务主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeQueryConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub logging: LoggingSettings,
    pub monitoring: MonitoringConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON 数组文件; 未设置时使用内置数据
    pub seed_path: Option<String>,
}

/// 查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page_size: usize,
    /// 单页上限; 未设置时不限制
    #[serde(default)]
    pub max_page_size: Option<usize>,
    /// 请求未指定 matchMode 时的组合方式
    pub match_mode: MatchMode,
}

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TradeQueryConfig {
    /// 加载配置
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            // 设置默认值
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("query.default_page_size", 10)?
            .set_default("query.match_mode", "any")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.file_prefix", "trade-query")?
            .set_default("monitoring.enabled", true)?
            .add_source(config::File::with_name("config/trade-query").required(false))
            .add_source(config::Environment::with_prefix("TRADE_QUERY").separator("__"))
            .build()?;

        let config: TradeQueryConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.query.default_page_size == 0 {
            return Err(anyhow::anyhow!("Default page size must be greater than 0"));
        }

        if let Some(max_page_size) = self.query.max_page_size {
            if max_page_size == 0 {
                return Err(anyhow::anyhow!("Max page size must be greater than 0"));
            }

            if self.query.default_page_size > max_page_size {
                return Err(anyhow::anyhow!(
                    "Default page size {} exceeds max page size {}",
                    self.query.default_page_size,
                    max_page_size
                ));
            }
        }

        Ok(())
    }
}

impl Default for TradeQueryConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            store: StoreConfig::default(),
            query: QueryConfig {
                default_page_size: 10,
                max_page_size: None,
                match_mode: MatchMode::Any,
            },
            logging: LoggingSettings::default(),
            monitoring: MonitoringConfig { enabled: true },
        }
    }
}
