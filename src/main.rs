use clap::Parser;
use sonar_chat::chat::CompletionClient;
use sonar_chat::config::{self, ServerConfig};
use sonar_chat::server::{self, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Perplexity 聊天前端服务
#[derive(Parser, Debug)]
#[command(name = "sonar-chat", about = "Web chat front-end for the Perplexity API")]
struct Args {
    /// 监听地址（覆盖配置文件）
    #[arg(long, env = "SONAR_CHAT_HOST")]
    host: Option<String>,

    /// 监听端口（覆盖配置文件）
    #[arg(long, env = "SONAR_CHAT_PORT")]
    port: Option<u16>,

    /// 可选的 YAML 配置文件路径
    #[arg(long, env = "SONAR_CHAT_CONFIG")]
    config: Option<String>,

    /// 会话导出目录（覆盖配置文件）
    #[arg(long, env = "SONAR_CHAT_EXPORT_DIR")]
    export_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(export_dir) = args.export_dir {
        config.export_dir = export_dir;
    }

    // 凭证缺失在这里终止进程，任何路由都不会开始服务
    let api_key = config::api_key_from_env()?;
    let client = CompletionClient::new(api_key)?;

    let state = Arc::new(AppState::new(Arc::new(client), &config.export_dir));
    let app = server::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "sonar-chat listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received");
}
