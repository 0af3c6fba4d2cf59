mod listings;
mod media;
mod posts;
mod reviews;
mod taxonomy;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::{error::Result, state::AppState};

/// 设置应用的路由。
///
/// - `/api`：公开的只读接口，以及评论提交、点赞和举报
/// - `/api/admin`：内容管理接口
pub fn setup_route(app: AppState) -> Router {
    Router::new()
        .nest("/api", public_routes().nest("/admin", admin_routes()))
        .with_state(app)
}

fn public_routes() -> Router<AppState> {
    posts::public_routes()
        .merge(taxonomy::public_routes())
        .merge(listings::public_routes())
        .merge(reviews::public_routes())
}

fn admin_routes() -> Router<AppState> {
    posts::admin_routes()
        .merge(taxonomy::admin_routes())
        .merge(listings::admin_routes())
        .merge(reviews::admin_routes())
        .merge(media::admin_routes())
}

/// 启动 HTTP 服务，并使用给定的路由处理请求。
///
/// 收到 Ctrl-C 后停止接收新连接，等待进行中的请求完成后返回。
#[instrument(name = "http server", skip_all, fields(addr = %addr))]
pub async fn run_server_with_router(router: Router, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// 启动 HTTP 服务，自动设置路由和中间件。
pub async fn run_server(app: AppState, addr: &str) -> Result<()> {
    let router = setup_route(app);
    let router = add_middlewares(router);
    run_server_with_router(router, addr).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// 为路由添加中间件，包括请求追踪和失败日志记录。
fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(|_req: &_, _span: &tracing::Span| {
                // 空实现，关闭请求日志
            }),
    )
}
