use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::content::ToolOutcome;
use crate::core::error::{ProviderError, ToolFault};
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::args::GetPageArgs;
use crate::domain::{ContentProvider, PageDetails};

#[derive(Clone)]
pub struct GetPageTool {
    provider: Arc<dyn ContentProvider>,
}

impl GetPageTool {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    async fn fetch(&self, title: &str) -> Result<PageDetails, ProviderError> {
        let page = self.provider.page(title).await?;
        let summary = self.provider.summary(&page).await?;
        let content = self.provider.content(&page).await?;
        Ok(PageDetails {
            title: page.title,
            summary,
            content,
            url: page.fullurl,
        })
    }
}

impl ToolSpec for GetPageTool {
    fn name(&self) -> &'static str {
        "getPage"
    }
    fn description(&self) -> &'static str {
        "Get content of a Wikipedia page by title"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
          "type": "object",
          "properties": { "title": { "type": "string", "description": "Page title" } },
          "required": ["title"]
        })
    }
}

#[async_trait]
impl Tool for GetPageTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolFault> {
        let args = GetPageArgs::try_from(arguments)?;
        tracing::debug!(title = %args.title, "getPage invoked");
        match self.fetch(&args.title).await {
            Ok(details) => ToolOutcome::json(&details),
            Err(e) => Ok(ToolOutcome::failed(format!("Error fetching page: {e}"))),
        }
    }
}
