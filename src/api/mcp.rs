use axum::Json;
use serde_json::{json, Value as J};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;
use crate::core::mcp::{InitializeResult, RpcReq, RpcResp, METHOD_NOT_FOUND};
use crate::infra::http::json as http_json;
use crate::tools::registry::ToolRegistry;

fn tools_list(reg: &ToolRegistry) -> J {
    json!({ "tools": reg.list() })
}

async fn call_tool(reg: &ToolRegistry, params: &J) -> Result<ToolOutcome, ToolFault> {
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolFault::InvalidParams("missing tool name".into()))?;
    let args = params.get("arguments").cloned().unwrap_or(J::Null);
    reg.call(name, args).await
}

/// Answer one JSON-RPC request. Shared by the HTTP shim and the line loop.
pub async fn dispatch(reg: &ToolRegistry, req: RpcReq) -> RpcResp {
    let id = req.id;
    match req.method.as_str() {
        "initialize" => http_json::ok(id, json!(InitializeResult::current())).0,
        "shutdown" => http_json::ok(id, J::Null).0,
        "tools/list" | "tools.list" | "listTools" => {
            let resp = http_json::ok(id, tools_list(reg)).0;
            tracing::trace!(response = ?resp, "tools/list response");
            resp
        }
        "tools/call" | "tools.call" | "callTool" => {
            let resp = http_json::from_tool_result(id, call_tool(reg, &req.params).await).0;
            if resp.error.is_some() {
                tracing::warn!(response = ?resp, "tools/call error response");
            }
            resp
        }
        other => http_json::error(id, METHOD_NOT_FOUND, format!("unknown method: {other}")).0,
    }
}

// HTTP handler
pub async fn http(
    axum::extract::State(reg): axum::extract::State<ToolRegistry>,
    Json(req): Json<RpcReq>,
) -> Json<RpcResp> {
    tracing::debug!(method = %req.method, id = ?req.id, "HTTP handler invoked");
    let resp = dispatch(&reg, req).await;
    tracing::debug!(response = ?resp, "HTTP handler completed");
    Json(resp)
}

/// Line-delimited JSON-RPC: one request per line in, one response per line
/// out. No handshake is required; `notifications/*` get no reply.
pub async fn serve_lines<R, W>(reg: ToolRegistry, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let resp = match serde_json::from_str::<RpcReq>(&line) {
            Ok(req) if req.method.starts_with("notifications/") => {
                tracing::debug!(method = %req.method, "notification ignored");
                continue;
            }
            Ok(req) => dispatch(&reg, req).await,
            Err(e) => http_json::parse_error(format!("parse error: {e}")).0,
        };
        let mut s = serde_json::to_string(&resp)?;
        s.push('\n');
        writer.write_all(s.as_bytes()).await?;
        writer.flush().await?;
    }
    tracing::info!("input closed, line loop finished");
    Ok(())
}

/// `MODE=lines`: the line loop over stdin/stdout until EOF or Ctrl-C.
pub async fn stdio_loop(reg: ToolRegistry) -> anyhow::Result<()> {
    tracing::info!("mode=lines");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    tokio::select! {
        res = serve_lines(reg, reader, writer) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, stopping line loop");
            Ok(())
        }
    }
}
