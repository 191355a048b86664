//! MCP transport layer: the interface the MCP provider consumes
//! to talk to one configured backend server, with HTTP, SSE, stdio, and
//! auto (SSE-then-HTTP fallback) implementations.

pub mod auto;
pub mod http;
pub mod sse;
pub mod stdio;

use async_trait::async_trait;
use thiserror::Error;

use crate::config_doc::McpServerConfig;
use crate::mcp::jsonrpc::{MCPRequest, MCPResponse};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport timed out")]
    Timeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse transport frame: {line}")]
    ParseFrame { line: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("transport initialization failed: {0}")]
    InitFailed(String),
}

/// Uniform request/response interface for one backend MCP server.
///
/// Implementations must be safe to call concurrently from multiple tasks,
/// serializing I/O internally as needed (stdio must serialize writes).
#[async_trait]
pub trait McpTransport: Send + Sync {
    async fn initialize(&self) -> Result<(), TransportError>;
    async fn send_request(&self, request: MCPRequest) -> Result<MCPResponse, TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds the concrete transport for a configured server.
pub async fn create_transport(
    config: &McpServerConfig,
) -> Result<std::sync::Arc<dyn McpTransport>, TransportError> {
    use crate::config_doc::McpServerTransportConfig as T;
    match &config.transport {
        T::Http { url, headers } => Ok(std::sync::Arc::new(http::HttpTransport::new(
            url.clone(),
            headers.clone(),
        ))),
        T::Sse { url, headers } => {
            let transport = sse::SseTransport::new(url.clone(), headers.clone());
            transport.initialize().await?;
            Ok(std::sync::Arc::new(transport))
        }
        T::Stdio { command, args, env } => {
            let transport = stdio::StdioTransport::new(command.clone(), args.clone(), env.clone());
            transport.initialize().await?;
            Ok(std::sync::Arc::new(transport))
        }
        T::Auto { url, headers } => {
            Ok(std::sync::Arc::new(auto::AutoTransport::new(url.clone(), headers.clone()).await))
        }
    }
}
