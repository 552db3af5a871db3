use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use todo_server::{create_axum_app, ServerConfig, TodoStore};
use tracing::{info, Level};

/// 基于文件持久化的Todo服务
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// 监听地址
    #[clap(short, long, env = "TODO_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// 存储文件路径
    #[clap(short, long, env = "TODO_STORE", default_value = "todos.json")]
    store: PathBuf,

    /// 不回显跨域头
    #[clap(long)]
    no_cors: bool,

    /// 日志级别
    #[clap(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config = ServerConfig::new()
        .with_bind_addr(args.bind)
        .with_store_path(args.store)
        .with_cors(!args.no_cors);

    TodoStore::new(&config.store_path)
        .verify()
        .await
        .with_context(|| format!("无法读取存储文件 {}", config.store_path.display()))?;

    let app = create_axum_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("无法绑定地址 {}", config.bind_addr))?;

    info!("服务器运行在 http://{}", config.bind_addr);
    info!("");
    info!("=== API端点列表 ===");
    info!("  GET    /todos     - Todo列表");
    info!("  GET    /todos/:id - 获取Todo");
    info!("  POST   /todos     - 创建Todo");
    info!("  PUT    /todos/:id - 更新Todo");
    info!("  DELETE /todos/:id - 删除Todo");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器异常退出")?;

    info!("服务器已关闭");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在关闭");
}
