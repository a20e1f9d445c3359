mod config;
mod handlers;
mod middleware;
mod services;
mod state;
mod storage;

use anyhow::Result;
use shared_utils::{AppMetrics, LoggingInitializer};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing::info;

use crate::{config::TradeQueryConfig, handlers::create_app, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let config = TradeQueryConfig::load()?;

    // 初始化日志
    LoggingInitializer::init(&config.logging)?;
    info!("Trade query configuration loaded");

    // 初始化指标
    let metrics = Arc::new(AppMetrics::new()?);
    info!("Metrics initialized");

    // 创建应用状态
    let state = AppState::new(config.clone(), metrics)?;
    info!("Application state initialized");

    let app = create_app(state);

    // 启动服务器
    let addr = config.server.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 Trade Query server starting on {}", addr);
    info!("📈 Trades API available at http://{}/trades", addr);
    info!("🏥 Health check available at http://{}/health", addr);
    if config.monitoring.enabled {
        info!("📊 Metrics available at http://{}/metrics", addr);
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
