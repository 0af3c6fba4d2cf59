pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod state;
pub mod storage;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use crate::{config::Config, error::Result, state::AppState};

/// 初始化日志，级别由 `TRAVELBOOK_LOG` 控制
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("TRAVELBOOK_LOG"))
        .init();
}

/// 读取配置、连接数据库并启动 HTTP 服务
///
/// 服务退出后关闭连接池。
pub async fn run() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let pool = storage::new_db_pool(&config).await?;
    tracing::info!(
        media_root = %config.media_root.display(),
        max_connections = config.pool.max_connections,
        "database pool ready"
    );

    let app = AppState::new(pool.clone(), &config.media_root);
    let result = api::run_server(app, &config.listen_addr).await;

    pool.close().await;
    tracing::info!("database pool closed");
    result
}
