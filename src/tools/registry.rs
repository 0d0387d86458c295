use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::core::content::ToolOutcome;
use crate::core::error::{ProviderError, ToolFault};
use crate::core::tool::Tool;
use crate::domain::ContentProvider;
use crate::infra::config::ProviderConfig;
use crate::infra::logging::log_metric;

use super::find_page::FindPageTool;
use super::get_page::GetPageTool;
use super::images::GetImagesForPageTool;
use super::on_this_day::OnThisDayTool;

/// One entry of `tools/list`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonValue,
}

/// Fixed set of tools, in advertisement order. Read-only once built and
/// cheap to clone into every transport.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<Vec<Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools: Arc::new(tools) }
    }

    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Route one call. Each call runs on its own task so a panicking handler
    /// becomes an `Internal` fault for that call only.
    pub async fn call(&self, name: &str, arguments: JsonValue) -> Result<ToolOutcome, ToolFault> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolFault::MethodNotFound(format!("Unknown tool: {name}")))?;

        let started = Instant::now();
        let handle = tokio::spawn(async move { tool.call(&arguments).await });
        let res = match handle.await {
            Ok(res) => res,
            Err(join) if join.is_panic() => {
                let payload = join.into_panic();
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tool handler panicked".to_owned());
                tracing::error!(tool = name, panic = %msg, "tool handler panicked");
                Err(ToolFault::Internal(msg))
            }
            Err(join) => Err(ToolFault::Internal(join.to_string())),
        };

        log_metric(name, "call_latency_ms", started.elapsed().as_secs_f64() * 1000.0);
        match &res {
            Ok(out) if out.is_error() => tracing::warn!(tool = name, error = out.text(), "tool reported failure"),
            Ok(_) => tracing::debug!(tool = name, "tool call ok"),
            Err(fault) => tracing::warn!(tool = name, code = fault.code(), error = %fault, "tool call rejected"),
        }
        res
    }
}

pub fn build_registry(provider: Arc<dyn ContentProvider>) -> ToolRegistry {
    ToolRegistry::with_tools(vec![
        Arc::new(OnThisDayTool::new(provider.clone())),
        Arc::new(FindPageTool::new(provider.clone())),
        Arc::new(GetPageTool::new(provider.clone())),
        Arc::new(GetImagesForPageTool::new(provider)),
    ])
}

/// Registry backed by the live Wikipedia client.
pub fn build_registry_from_config(cfg: &ProviderConfig) -> Result<ToolRegistry, ProviderError> {
    let remote = crate::clients::wikipedia::WikipediaRemote::from_config(cfg)?;
    Ok(build_registry(Arc::new(remote)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::ToolSpec;
    use crate::tools::testing::FakeProvider;
    use async_trait::async_trait;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        build_registry(Arc::new(FakeProvider::new()))
    }

    #[test]
    fn lists_the_four_tools_in_fixed_order() {
        let names: Vec<&str> = registry().list().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["onThisDay", "findPage", "getPage", "getImagesForPage"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let reg = registry();
        let a = serde_json::to_string(&reg.list()).unwrap();
        let b = serde_json::to_string(&reg.list()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"inputSchema\""));
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let err = registry().call("getWeather", json!({})).await.unwrap_err();
        assert_eq!(err, ToolFault::MethodNotFound("Unknown tool: getWeather".into()));
        assert_eq!(err.code(), -32601);
    }

    #[tokio::test]
    async fn routes_to_named_tool() {
        let out = registry().call("findPage", json!({"query": "Albert Einstein"})).await.unwrap();
        assert!(out.text().contains("Albert Einstein"));
    }

    struct Boom;

    impl ToolSpec for Boom {
        fn name(&self) -> &'static str {
            "boom"
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn input_schema(&self) -> JsonValue {
            json!({"type": "object"})
        }
    }

    #[async_trait]
    impl Tool for Boom {
        async fn call(&self, _arguments: &JsonValue) -> Result<ToolOutcome, ToolFault> {
            panic!("handler exploded")
        }
    }

    #[tokio::test]
    async fn panicking_handler_becomes_internal_fault() {
        let reg = ToolRegistry::with_tools(vec![Arc::new(Boom)]);
        let err = reg.call("boom", json!({})).await.unwrap_err();
        assert_eq!(err, ToolFault::Internal("handler exploded".into()));
        // the registry keeps serving
        assert!(reg.call("boom", json!({})).await.is_err());
    }
}
