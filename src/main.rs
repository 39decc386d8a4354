//! IronLink 主入口
//! BNS 域名与多链地址绑定服务

use std::sync::Arc;

use anyhow::Result;
use ironlink::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{db, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量
    dotenvy::dotenv().ok();

    // ✅ 2. 加载配置（环境变量 + 可选 CONFIG_PATH 文件）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // ✅ 3. 初始化日志，guard 需存活到进程结束
    let _log_guard = logging::init_logging(&config.logging)?;

    tracing::info!("🚀 Starting IronLink domain binding service");

    // ✅ 4. 连接数据库
    let pool = db::init_pool(&config.database).await?;
    tracing::info!("✅ Database connected");

    // ✅ 5. 运行数据库迁移
    if config.server.run_migrations {
        db::run_migrations(&pool).await?;
        tracing::info!("✅ Database migrations completed");
    } else {
        tracing::info!("⏭️ Database migrations skipped (RUN_MIGRATIONS=0)");
    }

    // ✅ 6. 初始化应用状态
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(pool, config.clone())?);
    tracing::info!(registry = %config.registry.base_url, "✅ BNS registry client ready");

    // ✅ 7. 构建路由并启动服务器
    let app = api::routes(state);
    let bind_addr = config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("🎉 Server listening on http://{}", bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/docs", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
