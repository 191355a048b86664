//! MCP router: implements JSON-RPC 2.0 dispatch over the
//! provider set. Never throws to the caller — every outcome is a valid
//! JSON-RPC response with the caller's `id` echoed.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::jsonrpc::{MCPError, MCPRequest, MCPResponse, CODE_INVALID_PARAMS, PROTOCOL_VERSION};
use crate::provider::{ProviderError, ToolsProvider};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("a provider failed to initialize: {0}")]
    ProviderInitFailed(#[from] ProviderError),
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

/// Aggregates providers in the mandated order: built-ins first, then MCP,
/// then REST — so a provider-mangled name collision with `cubicler_*` can
/// never shadow a built-in.
pub struct McpRouter {
    providers: Vec<Arc<dyn ToolsProvider>>,
    state: AtomicU8,
}

impl McpRouter {
    pub fn new(providers: Vec<Arc<dyn ToolsProvider>>) -> Self {
        Self {
            providers,
            state: AtomicU8::new(RouterState::Uninitialized as u8),
        }
    }

    /// Idempotent: fans `initialize()` out to every provider. A provider
    /// failure is fatal to router initialization.
    pub async fn initialize(&self) -> Result<(), RouterError> {
        if self.state.load(Ordering::SeqCst) == RouterState::Ready as u8 {
            return Ok(());
        }
        self.state
            .store(RouterState::Initializing as u8, Ordering::SeqCst);
        for provider in &self.providers {
            provider.initialize().await?;
        }
        self.state.store(RouterState::Ready as u8, Ordering::SeqCst);
        Ok(())
    }

    pub async fn tools_list(&self) -> Result<Vec<crate::model::ToolDefinition>, ProviderError> {
        let mut out = Vec::new();
        for provider in &self.providers {
            out.extend(provider.tools_list().await?);
        }
        Ok(out)
    }

    fn find_provider(&self, name: &str) -> Option<&Arc<dyn ToolsProvider>> {
        self.providers.iter().find(|p| p.can_handle_request(name))
    }

    /// Dispatches one JSON-RPC request. Always returns a response; never
    /// propagates an error to the caller.
    pub async fn handle(&self, request: MCPRequest) -> MCPResponse {
        let span = tracing::info_span!("mcp_router_handle", method = %request.method, id = %request.id);
        let _enter = span.enter();

        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => {
                if let Err(e) = self.initialize().await {
                    return MCPResponse::failure(id, MCPError::internal(e.to_string()));
                }
                MCPResponse::success(
                    id,
                    json!({
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": {"tools": {"listChanged": true}},
                        "serverInfo": {"name": "Cubicler", "version": env!("CARGO_PKG_VERSION")},
                    }),
                )
            }
            "tools/list" => match self.tools_list().await {
                Ok(tools) => {
                    let mcp_tools: Vec<Value> = tools
                        .into_iter()
                        .map(|t| {
                            json!({
                                "name": t.name,
                                "description": t.description,
                                "inputSchema": t.parameters,
                            })
                        })
                        .collect();
                    MCPResponse::success(id, json!({"tools": mcp_tools}))
                }
                Err(e) => MCPResponse::failure(id, MCPError::internal(e.to_string())),
            },
            "tools/call" => self.handle_tools_call(id, request.params).await,
            other => MCPResponse::failure(id, MCPError::method_not_supported(other)),
        }
    }

    async fn handle_tools_call(&self, id: super::jsonrpc::RequestId, params: Option<Value>) -> MCPResponse {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return MCPResponse::failure(
                id,
                MCPError::new(CODE_INVALID_PARAMS, "missing required parameter: name"),
            );
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let Some(provider) = self.find_provider(name) else {
            return MCPResponse::failure(
                id,
                MCPError::new(CODE_INVALID_PARAMS, format!("unknown tool: {name}")),
            );
        };

        match provider.tools_call(name, arguments).await {
            Ok(result) => {
                let text = match &result {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                MCPResponse::success(id, json!({"content": [{"type": "text", "text": text}]}))
            }
            Err(e) => MCPResponse::failure(id, MCPError::internal(e.to_string())),
        }
    }
}
