use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::args::OnThisDayArgs;
use crate::domain::ContentProvider;

#[derive(Clone)]
pub struct OnThisDayTool {
    provider: Arc<dyn ContentProvider>,
}

impl OnThisDayTool {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }
}

impl ToolSpec for OnThisDayTool {
    fn name(&self) -> &'static str {
        "onThisDay"
    }
    fn description(&self) -> &'static str {
        "Get historical events that occurred on a specific date"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
          "type": "object",
          "properties": {
            "date": {
              "type": "string",
              "description": "ISO8601 date portion (YYYY-MM-DD)",
              "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
            }
          },
          "required": ["date"]
        })
    }
}

#[async_trait]
impl Tool for OnThisDayTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolFault> {
        let args = OnThisDayArgs::try_from(arguments)?;
        tracing::debug!(month = args.month, day = args.day, "onThisDay invoked");
        match self.provider.on_this_day(args.month, args.day).await {
            Ok(data) => ToolOutcome::json(&data),
            Err(e) => Ok(ToolOutcome::failed(format!("Error fetching on this day data: {e}"))),
        }
    }
}
