//! Business-level tool results.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::core::error::ToolFault;

/// What a tool hands back once the provider has been reached. A `Failed`
/// outcome still travels as a successful response; only its `isError` flag
/// tells the caller the lookup did not work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failed(String),
}

impl ToolOutcome {
    /// Pretty-printed JSON text, the shape every tool returns on success.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolFault> {
        serde_json::to_string_pretty(value)
            .map(ToolOutcome::Success)
            .map_err(|e| ToolFault::Internal(e.to_string()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ToolOutcome::Failed(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Failed(_))
    }

    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success(t) | ToolOutcome::Failed(t) => t,
        }
    }

    /// `{ content: [{type:"text", text}], isError? }`
    pub fn to_wire(&self) -> JsonValue {
        let mut v = json!({ "content": [{ "type": "text", "text": self.text() }] });
        if self.is_error() {
            v["isError"] = JsonValue::Bool(true);
        }
        v
    }
}
