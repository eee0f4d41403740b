use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use personal_drive_rust::{
    logging,
    server::{auth, handlers},
    AppConfig, AppState, AuthGate,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 健康检查响应
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// 健康检查（不需要认证）
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// multipart 自身的头部和边界也占请求体，给上限加少量余量
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置，文件缺失时退回默认值 + 环境变量覆盖
    let config = AppConfig::load_or_default(Path::new("config/drive.toml"));

    // 初始化日志系统（必须保持 _log_guard 存活）
    let _log_guard = logging::init_logging(&config.log);

    info!("Personal Drive v{} 启动中...", env!("CARGO_PKG_VERSION"));

    if config.auth.password.is_empty() {
        tracing::warn!("认证密码为空，任何人都可以凭用户名访问");
    }
    // Basic 认证明文传输凭证，仅适合可信网络
    tracing::warn!("服务使用 HTTP Basic 认证且未加密，请勿直接暴露到公网");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let max_upload_size = config.storage.max_upload_size;

    let gate = Arc::new(AuthGate::new(&config.auth));
    let app_state = AppState::new(config)?;
    info!(
        "应用状态初始化完成, 根目录: {:?}",
        app_state.config.storage.root_dir
    );

    // 中间件层
    let middleware_stack = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    // 受认证保护的路由
    let drive_routes = Router::new()
        .route("/upload", post(handlers::upload_file))
        .route("/delete", post(handlers::delete_entry))
        .route("/rename", post(handlers::rename_entry))
        .route("/", get(handlers::browse))
        .route("/*path", get(handlers::browse))
        .layer(DefaultBodyLimit::max(
            max_upload_size as usize + MULTIPART_OVERHEAD,
        ))
        .with_state(app_state)
        .layer(middleware::from_fn_with_state(
            gate.clone(),
            auth::require_basic_auth,
        ));

    // 构建完整应用
    let app = Router::new()
        .route("/health", get(health_check))
        .merge(drive_routes)
        .layer(middleware_stack);

    // 启动服务器
    info!("服务器启动在: http://{}", addr);
    info!("健康检查: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // 使用 select! 监听关闭信号，支持优雅关闭
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器错误: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl+C，开始优雅关闭...");
        }
    }

    info!("应用已安全退出");

    Ok(())
}
