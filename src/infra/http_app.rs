use axum::{
    routing::{any_service, get, post},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::mcp_router::WikiSvc;
use crate::tools::registry::ToolRegistry;

/// Default app: `/healthz` + streamable MCP at `/mcp`.
pub fn build_app_default(registry: ToolRegistry) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(move || WikiSvc::new(registry.clone()), session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}

/// Default app **plus** the plain JSON-RPC route at `/v1/rpc`.
pub fn build_app_with_deprecated_api(registry: ToolRegistry) -> Router {
    let rpc = Router::new()
        .route("/v1/rpc", post(crate::api::mcp::http))
        .with_state(registry.clone());
    build_app_default(registry).merge(rpc)
}
