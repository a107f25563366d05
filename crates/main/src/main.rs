//! 主应用程序入口
//!
//! 组合根：装配目录、投递器、持久化网关与路由服务，启动 Axum 服务。

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use application::{
    ChannelMessageDeliverer, ChatService, ChatServiceDependencies, ConnectionDirectory,
    SystemClock,
};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgMessageRepository};
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();
    config.validate()?;

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 组装核心：目录与投递器是进程内共享的单实例，显式注入
    let directory = Arc::new(ConnectionDirectory::new());
    let deliverer = Arc::new(ChannelMessageDeliverer::new());
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));

    let chat_service = ChatService::new(ChatServiceDependencies {
        directory,
        message_repository,
        deliverer: deliverer.clone(),
        clock,
    });

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(Arc::new(chat_service), deliverer, jwt_service);

    // 跨域策略：只放行配置里的前端来源
    let cors = match &config.server.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        None => CorsLayer::permissive(),
    };

    let app = router(state).layer(TraceLayer::new_for_http()).layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
