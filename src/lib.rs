pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod service;
pub mod state;
pub mod storage;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Config;
use error::Result;
use render::MarkdownRenderer;
use state::AppState;
use storage::{MemoryStore, PgStore, Storage};

/// 日志过滤规则的环境变量
pub const LOG_ENV: &str = "YBLOG_LOG";

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env(LOG_ENV))
        .init();

    let config = Config::load()?;

    match config.database_url.as_deref() {
        Some(url) => {
            let db = storage::new_db_pool(url).await?;
            storage::migrate(&db).await?;
            serve(PgStore::new(db), config).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory only");
            serve(MemoryStore::new(), config).await
        }
    }
}

async fn serve<S: Storage>(store: S, config: Config) -> Result<()> {
    if config.admin_token.is_none() {
        tracing::info!("admin token not set, admin api disabled");
    }
    let app = AppState::new(store, MarkdownRenderer, config.admin_token);
    api::run_server(app, config.listen).await
}
