//! Provider services: each provider adapts one backend family to
//! a common `ToolsProvider` contract the MCP router dispatches against.

pub mod builtin;
pub mod mcp_provider;
pub mod rest_provider;
pub mod transport;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::model::ToolDefinition;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
    #[error("invalid tool name: {0}")]
    InvalidName(#[from] crate::codec::NameError),
    #[error("server not found: {0}")]
    ServerNotFound(String),
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Jwt(#[from] crate::jwt::JwtError),
    #[error(transparent)]
    Transform(#[from] crate::transform::TransformError),
}

/// Common capability set every backend family (MCP, REST, built-in)
/// implements so the router can treat them uniformly.
#[async_trait]
pub trait ToolsProvider: Send + Sync {
    fn identifier(&self) -> &str;
    async fn initialize(&self) -> Result<(), ProviderError>;
    async fn tools_list(&self) -> Result<Vec<ToolDefinition>, ProviderError>;
    async fn tools_call(&self, name: &str, args: Value) -> Result<Value, ProviderError>;
    fn can_handle_request(&self, name: &str) -> bool;
}
