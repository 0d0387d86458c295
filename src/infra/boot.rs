use std::net::SocketAddr;

use crate::infra::config::{Config, Mode, ProviderConfig};
use crate::tools::registry::{build_registry_from_config, ToolRegistry};

pub async fn run_server() -> anyhow::Result<()> {
    let cfg = Config::from_env();
    let provider = ProviderConfig::from_env_and_toml()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        deprecate_rest = cfg.deprecate_rest,
        base_url = %provider.base_url(),
        "BOOT wiki-mcp-gateway"
    );
    let registry = build_registry_from_config(&provider)?;

    match cfg.mode {
        Mode::Stdio => crate::infra::runtime::mcp_transport::serve_stdio(
            crate::tools::mcp_router::WikiSvc::new(registry),
        )
        .await
        .map_err(|e| anyhow::anyhow!(e)),
        Mode::Lines => crate::api::mcp::stdio_loop(registry).await,
        Mode::Server => serve_http(&cfg, registry).await,
    }
}

async fn serve_http(cfg: &Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let app = if cfg.deprecate_rest {
        crate::infra::http_app::build_app_default(registry)
    } else {
        crate::infra::http_app::build_app_with_deprecated_api(registry)
    };

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("interrupt received, shutting down");
        })
        .await?;
    Ok(())
}
