use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// RUST_LOG 未设置时使用的过滤级别
    pub level: String,
    pub format: LogFormat,
    /// 设置后按天滚动写入该目录, 否则输出到 stdout
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "trade-query".to_string(),
        }
    }
}

/// 全局日志初始化
pub struct LoggingInitializer;

impl LoggingInitializer {
    /// 开发环境: 可读格式, 输出到终端
    pub fn init_dev() -> Result<()> {
        Self::init(&LoggingSettings::default())
    }

    /// 生产环境: JSON 格式
    pub fn init_json() -> Result<()> {
        Self::init(&LoggingSettings {
            format: LogFormat::Json,
            ..Default::default()
        })
    }

    pub fn init(settings: &LoggingSettings) -> Result<()> {
        let filter = Self::build_filter(&settings.level)?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);

        let result = match &settings.directory {
            Some(directory) => {
                let appender =
                    tracing_appender::rolling::daily(directory, &settings.file_prefix);
                match settings.format {
                    LogFormat::Json => builder
                        .json()
                        .with_ansi(false)
                        .with_writer(appender)
                        .try_init(),
                    LogFormat::Pretty => builder.with_ansi(false).with_writer(appender).try_init(),
                }
            }
            None => match settings.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.try_init(),
            },
        };

        result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
    }

    /// RUST_LOG 优先, 否则使用配置级别
    fn build_filter(level: &str) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(level)
                .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e)),
        }
    }
}
