//! Auto MCP transport: attempts SSE initialization; on any failure falls
//! back to HTTP. The decision is cached for the lifetime of the transport.

use async_trait::async_trait;
use std::collections::HashMap;

use super::http::HttpTransport;
use super::sse::SseTransport;
use super::{McpTransport, TransportError};
use crate::mcp::jsonrpc::{MCPRequest, MCPResponse};

enum Chosen {
    Sse(SseTransport),
    Http(HttpTransport),
}

pub struct AutoTransport {
    chosen: Chosen,
}

impl AutoTransport {
    pub async fn new(url: String, headers: HashMap<String, String>) -> Self {
        let sse = SseTransport::new(url.clone(), headers.clone());
        let chosen = match sse.initialize().await {
            Ok(()) => {
                tracing::debug!(url, "auto transport: SSE initialization succeeded");
                Chosen::Sse(sse)
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "auto transport: SSE init failed, falling back to HTTP");
                Chosen::Http(HttpTransport::new(url, headers))
            }
        };
        Self { chosen }
    }
}

#[async_trait]
impl McpTransport for AutoTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        // The SSE-vs-HTTP decision already ran `initialize` on the SSE leg in
        // `new`; HTTP has no initialization step.
        Ok(())
    }

    async fn send_request(&self, request: MCPRequest) -> Result<MCPResponse, TransportError> {
        match &self.chosen {
            Chosen::Sse(t) => t.send_request(request).await,
            Chosen::Http(t) => t.send_request(request).await,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match &self.chosen {
            Chosen::Sse(t) => t.close().await,
            Chosen::Http(t) => t.close().await,
        }
    }
}
