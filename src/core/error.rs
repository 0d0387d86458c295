use thiserror::Error;

use crate::core::mcp::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};

/// Protocol-level fault: the call is rejected outright and must be treated
/// as not performed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolFault {
    #[error("{0}")]
    MethodNotFound(String),
    #[error("{0}")]
    InvalidParams(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolFault {
    /// JSON-RPC error code for the wire envelope.
    pub fn code(&self) -> i32 {
        match self {
            ToolFault::MethodNotFound(_) => METHOD_NOT_FOUND,
            ToolFault::InvalidParams(_) => INVALID_PARAMS,
            ToolFault::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<anyhow::Error> for ToolFault {
    fn from(e: anyhow::Error) -> Self {
        ToolFault::Internal(e.to_string())
    }
}

/// Failure talking to the content provider. Tools surface these as
/// business-level errors, never as protocol faults.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream status {0}")]
    Status(u16),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{code}: {info}")]
    Api { code: String, info: String },
}

impl ProviderError {
    /// Transport failures and 5xx are worth another attempt; everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status(code) => *code >= 500,
            ProviderError::NotFound(_) | ProviderError::Decode(_) | ProviderError::Api { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Failure driving a spawned server process.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to spawn server: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_maps_faults_to_json_rpc_codes() {
        assert_eq!(ToolFault::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(ToolFault::InvalidParams("x".into()).code(), -32602);
        assert_eq!(ToolFault::Internal("x".into()).code(), -32603);
    }

    #[test]
    fn it_converts_from_anyhow() {
        let any: anyhow::Error = anyhow::anyhow!("nope");
        let fault: ToolFault = any.into();
        assert_eq!(fault, ToolFault::Internal("nope".into()));
        assert_eq!(fault.to_string(), "Internal error: nope");
    }

    #[test]
    fn only_transient_provider_errors_are_retryable() {
        assert!(ProviderError::Transport("reset".into()).is_retryable());
        assert!(ProviderError::Status(503).is_retryable());
        assert!(!ProviderError::Status(404).is_retryable());
        assert!(!ProviderError::NotFound("Nowhere".into()).is_retryable());
        assert!(!ProviderError::Decode("eof".into()).is_retryable());
    }
}
