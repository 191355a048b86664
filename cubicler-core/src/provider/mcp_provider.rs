//! MCP provider: aggregates `tools/list`/`tools/call` across configured MCP
//! servers, renaming each tool with the hash-based function-name codec.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::transport::{create_transport, McpTransport};
use super::{ProviderError, ToolsProvider};
use crate::codec;
use crate::config_doc::McpServerConfig;
use crate::mcp::jsonrpc::{MCPRequest, RequestId};
use crate::model::ToolDefinition;

pub struct McpProvider {
    servers: Vec<McpServerConfig>,
    transports: DashMap<String, Arc<OnceCell<Arc<dyn McpTransport>>>>,
}

impl McpProvider {
    pub fn new(servers: Vec<McpServerConfig>) -> Self {
        Self {
            servers,
            transports: DashMap::new(),
        }
    }

    async fn transport_for(
        &self,
        server: &McpServerConfig,
    ) -> Result<Arc<dyn McpTransport>, ProviderError> {
        // check-then-create-under-lock: the `DashMap` entry holds a shard
        // lock only long enough to install the (possibly empty) `OnceCell`;
        // the actual transport creation is serialized per server by the
        // cell itself, so concurrent callers racing for the same server
        // never create duplicate transports.
        let cell = Arc::clone(
            self.transports
                .entry(server.identifier.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        );
        let transport = cell
            .get_or_try_init(|| create_transport(server))
            .await?;
        Ok(Arc::clone(transport))
    }

    fn server_for_hash(&self, hash: &str) -> Option<&McpServerConfig> {
        self.servers
            .iter()
            .find(|s| codec::hash6(&s.identifier, s.transport.primary_string()) == hash)
    }
}

#[async_trait]
impl ToolsProvider for McpProvider {
    fn identifier(&self) -> &str {
        "mcp"
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn tools_list(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        let mut out = Vec::new();
        for server in &self.servers {
            let transport = match self.transport_for(server).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(server = server.identifier, error = %e, "MCP server unreachable, skipping");
                    continue;
                }
            };

            let req = MCPRequest::new(
                RequestId::String(format!("{}-tools-list", server.identifier)),
                "tools/list",
                None,
            );
            let resp = match transport.send_request(req).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(server = server.identifier, error = %e, "tools/list failed, skipping server");
                    continue;
                }
            };
            let Some(result) = resp.result else {
                tracing::warn!(server = server.identifier, "tools/list returned an error, skipping server");
                continue;
            };
            let tools = result.get("tools").and_then(Value::as_array).cloned().unwrap_or_default();
            for tool in tools {
                let Some(name) = tool.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let description = tool
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let parameters = tool.get("inputSchema").cloned().unwrap_or(Value::Null);
                let mangled = codec::encode(&server.identifier, server.transport.primary_string(), name);
                out.push(ToolDefinition {
                    name: mangled,
                    description,
                    parameters,
                });
            }
        }
        Ok(out)
    }

    async fn tools_call(&self, name: &str, args: Value) -> Result<Value, ProviderError> {
        let (hash, function) = codec::decode(name)?;
        let server = self
            .server_for_hash(hash)
            .ok_or_else(|| ProviderError::ServerNotFound(hash.to_string()))?
            .clone();
        let transport = self.transport_for(&server).await?;

        let req = MCPRequest::new(
            RequestId::String(format!("{}-call-{}", server.identifier, function)),
            "tools/call",
            Some(serde_json::json!({"name": function, "arguments": args})),
        );
        let resp = transport.send_request(req).await?;
        match resp.result {
            Some(result) => Ok(result),
            None => {
                let err = resp.error.unwrap_or_else(|| {
                    crate::mcp::jsonrpc::MCPError::internal("tools/call returned no result")
                });
                Err(ProviderError::UpstreamStatus(err.code.unsigned_abs() as u16))
            }
        }
    }

    fn can_handle_request(&self, name: &str) -> bool {
        match codec::decode(name) {
            Ok((hash, _)) => self.server_for_hash(hash).is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_doc::McpServerTransportConfig;

    fn server(identifier: &str, url: &str) -> McpServerConfig {
        McpServerConfig {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            description: "".to_string(),
            transport: McpServerTransportConfig::Http {
                url: url.to_string(),
                headers: Default::default(),
            },
        }
    }

    #[test]
    fn can_handle_request_checks_hash_not_identifier_scan() {
        let provider = McpProvider::new(vec![server("weather_service", "http://localhost:4000/mcp")]);
        let name = codec::encode("weather_service", "http://localhost:4000/mcp", "getWeather");
        assert!(provider.can_handle_request(&name));
        assert!(!provider.can_handle_request("000000_get_weather"));
    }
}
