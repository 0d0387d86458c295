pub mod collector;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::args::GetImagesArgs;
use crate::domain::ContentProvider;

#[derive(Clone)]
pub struct GetImagesForPageTool {
    provider: Arc<dyn ContentProvider>,
}

impl GetImagesForPageTool {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }
}

impl ToolSpec for GetImagesForPageTool {
    fn name(&self) -> &'static str {
        "getImagesForPage"
    }
    fn description(&self) -> &'static str {
        "Get images from a Wikipedia page by title"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
          "type": "object",
          "properties": {
            "title": { "type": "string", "description": "Page title" },
            "limit": {
              "type": ["string", "number"],
              "description": "Maximum number of images to retrieve (default: 50)"
            }
          },
          "required": ["title"]
        })
    }
}

#[async_trait]
impl Tool for GetImagesForPageTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolFault> {
        let args = GetImagesArgs::try_from(arguments)?;
        tracing::debug!(title = %args.title, limit = args.limit, "getImagesForPage invoked");
        let page = match self.provider.page(&args.title).await {
            Ok(page) => page,
            Err(e) => return Ok(ToolOutcome::failed(format!("Error fetching images: {e}"))),
        };
        let images = collector::collect_images(self.provider.as_ref(), &page, args.limit).await;
        ToolOutcome::json(&images)
    }
}
