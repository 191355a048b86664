//! Internal tools service: the two always-present built-ins,
//! `cubicler_available_servers` and `cubicler_fetch_server_tools`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ProviderError, ToolsProvider};
use crate::codec;
use crate::model::ToolDefinition;

pub const AVAILABLE_SERVERS: &str = "cubicler_available_servers";
pub const FETCH_SERVER_TOOLS: &str = "cubicler_fetch_server_tools";

/// Identifying information the builtin provider needs about each configured
/// server, independent of its transport.
#[derive(Clone)]
pub struct ServerIdentity {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub primary_string: String,
}

pub struct BuiltinToolsProvider {
    servers: Vec<ServerIdentity>,
    backends: Vec<Arc<dyn ToolsProvider>>,
}

impl BuiltinToolsProvider {
    pub fn new(servers: Vec<ServerIdentity>, backends: Vec<Arc<dyn ToolsProvider>>) -> Self {
        Self { servers, backends }
    }

    fn tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: AVAILABLE_SERVERS.to_string(),
                description: "List all available tool servers and their tool counts".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            },
            ToolDefinition {
                name: FETCH_SERVER_TOOLS.to_string(),
                description: "Fetch the tools exposed by a specific server".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {"serverIdentifier": {"type": "string"}},
                    "required": ["serverIdentifier"],
                }),
            },
        ]
    }

    async fn available_servers(&self) -> Value {
        let mut servers = Vec::with_capacity(self.servers.len());
        for server in &self.servers {
            let tools_count = self.count_tools_for(server).await;
            servers.push(json!({
                "identifier": server.identifier,
                "name": server.name,
                "description": server.description,
                "toolsCount": tools_count,
            }));
        }
        json!({"total": servers.len(), "servers": servers})
    }

    async fn count_tools_for(&self, server: &ServerIdentity) -> usize {
        let prefix = format!("{}_", codec::hash6(&server.identifier, &server.primary_string));
        let mut count = 0;
        for backend in &self.backends {
            match backend.tools_list().await {
                Ok(tools) => {
                    count += tools.iter().filter(|t| t.name.starts_with(&prefix)).count();
                }
                Err(e) => {
                    tracing::warn!(server = server.identifier, error = %e, "provider failed during tools count");
                }
            }
        }
        count
    }

    async fn fetch_server_tools(&self, server_identifier: &str) -> Result<Value, ProviderError> {
        if server_identifier == "cubicler" {
            return Ok(json!({"tools": Self::tool_definitions()}));
        }

        let server = self
            .servers
            .iter()
            .find(|s| s.identifier == server_identifier)
            .ok_or_else(|| ProviderError::ServerNotFound(server_identifier.to_string()))?;
        let prefix = format!("{}_", codec::hash6(&server.identifier, &server.primary_string));

        let mut tools = Vec::new();
        for backend in &self.backends {
            if let Ok(backend_tools) = backend.tools_list().await {
                tools.extend(backend_tools.into_iter().filter(|t| t.name.starts_with(&prefix)));
            }
        }
        Ok(json!({"tools": tools}))
    }
}

#[async_trait]
impl ToolsProvider for BuiltinToolsProvider {
    fn identifier(&self) -> &str {
        "cubicler"
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn tools_list(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(Self::tool_definitions())
    }

    async fn tools_call(&self, name: &str, args: Value) -> Result<Value, ProviderError> {
        match name {
            AVAILABLE_SERVERS => Ok(self.available_servers().await),
            FETCH_SERVER_TOOLS => {
                let server_identifier = args
                    .get("serverIdentifier")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::UnknownTool(name.to_string()))?;
                self.fetch_server_tools(server_identifier).await
            }
            other => Err(ProviderError::UnknownTool(other.to_string())),
        }
    }

    fn can_handle_request(&self, name: &str) -> bool {
        name.starts_with("cubicler_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_server_tools_for_cubicler_returns_builtins() {
        let provider = BuiltinToolsProvider::new(vec![], vec![]);
        let result = provider
            .tools_call(FETCH_SERVER_TOOLS, json!({"serverIdentifier": "cubicler"}))
            .await
            .unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
    }

    #[tokio::test]
    async fn fetch_server_tools_unknown_server_errors() {
        let provider = BuiltinToolsProvider::new(vec![], vec![]);
        let err = provider
            .tools_call(FETCH_SERVER_TOOLS, json!({"serverIdentifier": "nope"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ServerNotFound(_)));
    }
}
