//! rmcp handler over the tool registry. Descriptors and routing come from
//! `ToolRegistry`, so the MCP transports advertise exactly what the plain
//! JSON-RPC surfaces do.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorCode, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};

use crate::core::error::ToolFault;
use crate::tools::registry::ToolRegistry;

#[derive(Clone)]
pub struct WikiSvc {
    registry: ToolRegistry,
}

impl WikiSvc {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn tools(&self) -> Vec<McpTool> {
        self.registry
            .list()
            .into_iter()
            .map(|d| {
                let schema: JsonObject = match d.input_schema {
                    serde_json::Value::Object(map) => map,
                    _ => JsonObject::new(),
                };
                McpTool::new(d.name, d.description, Arc::new(schema))
            })
            .collect()
    }
}

fn to_error_data(fault: ToolFault) -> ErrorData {
    match fault {
        ToolFault::MethodNotFound(msg) => ErrorData::new(ErrorCode::METHOD_NOT_FOUND, msg, None),
        ToolFault::InvalidParams(msg) => ErrorData::invalid_params(msg, None),
        internal @ ToolFault::Internal(_) => ErrorData::internal_error(internal.to_string(), None),
    }
}

impl ServerHandler for WikiSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Wikipedia lookups: onThisDay, findPage, getPage and getImagesForPage.".into(),
            ),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            tracing::debug!(tool = %request.name, "mcp tools/call");
            let arguments = request
                .arguments
                .map(serde_json::Value::Object)
                .unwrap_or(serde_json::Value::Null);
            match self.registry.call(&request.name, arguments).await {
                Ok(out) if out.is_error() => Ok(CallToolResult::error(vec![Content::text(out.text())])),
                Ok(out) => Ok(CallToolResult::success(vec![Content::text(out.text())])),
                Err(fault) => Err(to_error_data(fault)),
            }
        }
    }
}
