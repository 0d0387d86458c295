use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::args::FindPageArgs;
use crate::domain::ContentProvider;

#[derive(Clone)]
pub struct FindPageTool {
    provider: Arc<dyn ContentProvider>,
}

impl FindPageTool {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }
}

impl ToolSpec for FindPageTool {
    fn name(&self) -> &'static str {
        "findPage"
    }
    fn description(&self) -> &'static str {
        "Search for Wikipedia pages matching a query"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
          "type": "object",
          "properties": { "query": { "type": "string", "description": "Search query" } },
          "required": ["query"]
        })
    }
}

#[async_trait]
impl Tool for FindPageTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolFault> {
        let args = FindPageArgs::try_from(arguments)?;
        tracing::debug!(query = %args.query, "findPage invoked");
        match self.provider.search(&args.query).await {
            Ok(results) => ToolOutcome::json(&results),
            Err(e) => Ok(ToolOutcome::failed(format!("Error searching for pages: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::FakeProvider;

    #[tokio::test]
    async fn returns_search_results_as_text() {
        let tool = FindPageTool::new(Arc::new(FakeProvider::new()));
        let out = tool.call(&json!({"query": "Albert Einstein"})).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(out.text()).unwrap();
        assert_eq!(v["results"][0]["title"], "Albert Einstein");
    }

    #[tokio::test]
    async fn whitespace_query_is_invalid_params() {
        let tool = FindPageTool::new(Arc::new(FakeProvider::new()));
        let err = tool.call(&json!({"query": " \t "})).await.unwrap_err();
        assert_eq!(err, ToolFault::InvalidParams("Invalid findPage arguments. Expected { query: string }".into()));
    }

    #[tokio::test]
    async fn provider_failure_is_business_error() {
        let tool = FindPageTool::new(Arc::new(FakeProvider::failing()));
        let out = tool.call(&json!({"query": "x"})).await.unwrap();
        assert!(out.is_error());
        assert!(out.text().starts_with("Error searching for pages: "));
    }
}
