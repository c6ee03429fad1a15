//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use repcoach::auth;
use repcoach::build_info;
use repcoach::chat::{ChatOrchestrator, ChatSettings};
use repcoach::config::{self, Config};
use repcoach::gate::RouteTable;
use repcoach::llm::OpenAICompatibleProvider;
use repcoach::server::{self, AppState};
use repcoach::store::{FileWorkoutStore, WorkoutStore};
use repcoach::tools::{ProgressTool, ToolExecutor};

/// Connect timeout for outbound HTTP (model provider and auth service).
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path)
        .await
        .with_context(|| format!("failed to load config from {config_path}"))?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    info!(version = %build_info::version_string(), "Starting repcoach");

    let storage_path = config::resolve_path(
        Path::new(config_path),
        config
            .storage
            .path
            .as_deref()
            .unwrap_or(Path::new(config::DEFAULT_STORAGE_DIR)),
    );
    info!(path = %storage_path.display(), "Using workout storage");
    let store: Arc<dyn WorkoutStore> = Arc::new(FileWorkoutStore::new(storage_path));

    let http = reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let verifier = auth::build_verifier(&config.auth, &config.gate.session_cookie, http.clone())?;
    info!(mode = ?config.auth.mode, "Session verifier ready");

    if config.llm.api_key.is_none() {
        warn!("llm.api_key is not set; requests go out unauthenticated");
    }
    let provider = Arc::new(OpenAICompatibleProvider::new(
        http,
        &config.llm.base_url,
        config.llm.api_key.clone(),
    ));
    let tools = ToolExecutor::new().register(Arc::new(ProgressTool));
    let chat = ChatOrchestrator::new(
        provider,
        tools,
        ChatSettings::from_config(&config.chat, &config.llm),
    );
    info!(
        model = %config.llm.model,
        timeout_seconds = config.chat.timeout_seconds,
        max_steps = config.chat.max_steps,
        "Chat orchestrator ready"
    );

    let state = AppState {
        routes: Arc::new(RouteTable::from_config(&config.gate)),
        verifier,
        store,
        chat: Arc::new(chat),
        keep_alive_interval_seconds: config.server.keep_alive_interval_seconds,
        max_connections: config.server.max_connections,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server.host '{}'", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
