// invhub - 资产清单服务
// 应用入口

use anyhow::{Context, Result};
use tracing::info;

use invhub::api;
use invhub::config::{resolve_config_path, AppConfig};
use invhub::logging;
use invhub::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // 可以通过 RUST_LOG 环境变量控制日志级别，例如：RUST_LOG=debug
    logging::init_tracing();

    let config_path = resolve_config_path(std::env::args().nth(1));
    let mut config = AppConfig::load(&config_path)?;
    config.apply_env();

    let state = AppState::from_config(&config);
    let app = api::build_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(
        "invhub listening on {} (static dir {})",
        config.listen_addr,
        config.static_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("invhub stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
