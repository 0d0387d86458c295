use axum::Json;

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;
use crate::core::mcp::{err as rpc_err, ok as rpc_ok, RpcErr, RpcResp, PARSE_ERROR};

pub fn ok(id: serde_json::Value, result: serde_json::Value) -> Json<RpcResp> {
    Json(rpc_ok(id, result))
}

pub fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(id, code, message, None))
}

pub fn parse_error(message: impl Into<String>) -> Json<RpcResp> {
    Json(RpcResp {
        jsonrpc: "2.0",
        id: serde_json::Value::Null,
        result: None,
        error: Some(RpcErr {
            code: PARSE_ERROR,
            message: message.into(),
            data: None,
        }),
    })
}

/// Collapse the handler-boundary result into one of the two wire shapes:
/// a result envelope (possibly flagged `isError`) or an error envelope.
pub fn from_tool_result(id: serde_json::Value, res: Result<ToolOutcome, ToolFault>) -> Json<RpcResp> {
    match res {
        Ok(outcome) => ok(id, outcome.to_wire()),
        Err(fault) => error(id, fault.code(), fault.to_string()),
    }
}
