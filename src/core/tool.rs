use async_trait::async_trait;

use crate::core::content::ToolOutcome;
use crate::core::error::ToolFault;

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> serde_json::Value;
}

/// Tool = Spec + handler. Handlers parse their argument bag into a typed
/// struct before doing anything else; a bag that does not parse is an
/// `InvalidParams` fault.
#[async_trait]
pub trait Tool: ToolSpec + Send + Sync {
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolFault>;
}
