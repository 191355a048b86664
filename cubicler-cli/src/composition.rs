//! Composition root: builds every piece of Cubicler state from the three
//! configuration documents.
//!
//! Phase 1 constructs providers and agent transports from config alone;
//! phase 2 calls [`McpRouter::initialize`] once, fanning out to every
//! provider's own (idempotent) initialization.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use cubicler_core::agent::direct_openai::DirectOpenAiTransport;
use cubicler_core::agent::http::HttpAgentTransport;
use cubicler_core::agent::sse::{SseAgentRegistry, SseAgentTransport};
use cubicler_core::agent::stdio_pool::StdioPool;
use cubicler_core::agent::AgentTransport;
use cubicler_core::config_doc::{AgentTransportConfig, ConfigError, ConfigLoader, McpServerTransportConfig};
use cubicler_core::mcp::bridge::SseRegistry;
use cubicler_core::provider::builtin::{BuiltinToolsProvider, ServerIdentity};
use cubicler_core::provider::mcp_provider::McpProvider;
use cubicler_core::provider::rest_provider::RestProvider;
use cubicler_core::provider::ToolsProvider;
use cubicler_core::{DispatchService, HealthService, McpRouter, RouterError, WebhookService};
use cubicler_serve::AppState;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Router(#[from] RouterError),
}

fn server_identity(identifier: &str, name: &str, description: &str, transport: &McpServerTransportConfig) -> ServerIdentity {
    ServerIdentity {
        identifier: identifier.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        primary_string: transport.primary_string().to_string(),
    }
}

/// Registry for SSE-transported agents; held alongside the built state so the
/// inbound "agent POSTs its response" endpoint can reach it, if the caller
/// wants to expose one (Cubicler's own HTTP surface does not today — no
/// configured example in this deployment uses the `sse` agent transport).
pub struct Composition {
    pub state: Arc<AppState>,
    pub sse_agents: Arc<SseAgentRegistry>,
}

pub async fn build() -> Result<Composition, CompositionError> {
    let config_loader = ConfigLoader::new();
    let agents_config = config_loader.load_agents_config().await?;
    let providers_config = config_loader.load_providers_config().await?;
    let webhooks_config = config_loader.load_webhooks_config().await?;

    let mut backends: Vec<Arc<dyn ToolsProvider>> = Vec::new();
    if !providers_config.mcp_servers.is_empty() {
        backends.push(Arc::new(McpProvider::new(providers_config.mcp_servers.clone())));
    }
    for server in &providers_config.rest_servers {
        backends.push(Arc::new(RestProvider::new(server.clone())));
    }

    let server_identities: Vec<ServerIdentity> = providers_config
        .mcp_servers
        .iter()
        .map(|s| server_identity(&s.identifier, &s.name, &s.description, &s.transport))
        .chain(providers_config.rest_servers.iter().map(|s| ServerIdentity {
            identifier: s.identifier.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
            primary_string: s.url.clone(),
        }))
        .collect();

    let mut providers: Vec<Arc<dyn ToolsProvider>> = vec![Arc::new(BuiltinToolsProvider::new(
        server_identities,
        backends.clone(),
    ))];
    providers.extend(backends);

    let router = Arc::new(McpRouter::new(providers));
    router.initialize().await?;

    let sse_agents = Arc::new(SseAgentRegistry::new());
    let mut transports: HashMap<String, Arc<dyn AgentTransport>> = HashMap::new();
    for (identifier, agent) in &agents_config.agents {
        let transport: Arc<dyn AgentTransport> = match &agent.transport {
            AgentTransportConfig::Http { url, headers } => {
                Arc::new(HttpAgentTransport::new(url.clone(), headers.clone()))
            }
            AgentTransportConfig::Sse { .. } => {
                Arc::new(SseAgentTransport::new(identifier.clone(), sse_agents.clone()))
            }
            AgentTransportConfig::Stdio { command, args, env, pool } => Arc::new(StdioPool::new(
                command.clone(),
                args.clone(),
                env.clone(),
                pool.clone(),
            )),
            AgentTransportConfig::Direct {
                api_key,
                model,
                max_tool_iterations,
                ..
            } => Arc::new(DirectOpenAiTransport::new(
                api_key.clone(),
                model.clone(),
                *max_tool_iterations,
                router.clone(),
            )),
        };
        transports.insert(identifier.clone(), transport);
    }

    let dispatch = Arc::new(DispatchService::new(
        agents_config.clone(),
        providers_config.clone(),
        router.clone(),
        transports,
    ));
    let health = Arc::new(HealthService::new(
        agents_config.clone(),
        providers_config,
        router.clone(),
    ));
    let webhook = Arc::new(WebhookService::new(webhooks_config, dispatch.clone()));

    let state = Arc::new(AppState {
        dispatch,
        webhook,
        health,
        router,
        agents: agents_config,
        sse: Arc::new(SseRegistry::new()),
    });

    Ok(Composition { state, sse_agents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_fails_when_no_config_sources_are_configured() {
        for var in ["CUBICLER_AGENTS_LIST", "CUBICLER_PROVIDERS_LIST", "CUBICLER_WEBHOOKS_LIST"] {
            std::env::remove_var(var);
        }
        let err = build().await.unwrap_err();
        assert!(matches!(err, CompositionError::Config(_)));
    }
}
