//! Dispatch service: resolves the target agent, composes its
//! system prompt, aggregates the current tool/server list, and invokes the
//! agent's transport, normalizing every outcome into a `DispatchResponse`.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::{AgentTransport, AgentTransportError};
use crate::config_doc::{AgentsConfig, ProvidersConfig};
use crate::mcp::router::McpRouter;
use crate::model::{AgentRequest, AgentSummary, DispatchRequest, DispatchResponse, ServerSummary};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("messages must not be empty")]
    EmptyMessages,
    #[error("unknown agent: {0}")]
    AgentNotFound(String),
    #[error("no configured agents")]
    NoAgentsConfigured,
    #[error("no transport registered for agent: {0}")]
    NoTransportForAgent(String),
}

pub struct DispatchService {
    agents: AgentsConfig,
    providers: ProvidersConfig,
    router: Arc<McpRouter>,
    transports: HashMap<String, Arc<dyn AgentTransport>>,
}

impl DispatchService {
    pub fn new(
        agents: AgentsConfig,
        providers: ProvidersConfig,
        router: Arc<McpRouter>,
        transports: HashMap<String, Arc<dyn AgentTransport>>,
    ) -> Self {
        Self {
            agents,
            providers,
            router,
            transports,
        }
    }

    fn resolve_agent(&self, agent_identifier: Option<&str>) -> Result<&str, DispatchError> {
        match agent_identifier {
            Some(id) if self.agents.agents.contains_key(id) => Ok(id),
            Some(id) => Err(DispatchError::AgentNotFound(id.to_string())),
            None => self
                .agents
                .first_identifier()
                .ok_or(DispatchError::NoAgentsConfigured),
        }
    }

    fn compose_prompt(&self, agent_prompt: &Option<String>) -> String {
        let mut parts = Vec::new();
        if let Some(base) = &self.agents.base_prompt {
            if !base.is_empty() {
                parts.push(base.clone());
            }
        }
        let specific = agent_prompt.clone().or_else(|| self.agents.default_prompt.clone());
        if let Some(specific) = specific {
            if !specific.is_empty() {
                parts.push(specific);
            }
        }
        if parts.is_empty() {
            "You are a helpful AI assistant powered by Cubicler.".to_string()
        } else {
            parts.join("\n\n")
        }
    }

    fn server_summaries(&self) -> Vec<ServerSummary> {
        let mcp = self.providers.mcp_servers.iter().map(|s| ServerSummary {
            identifier: s.identifier.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
        });
        let rest = self.providers.rest_servers.iter().map(|s| ServerSummary {
            identifier: s.identifier.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
        });
        mcp.chain(rest).collect()
    }

    /// Dispatches one request. Hard failures (unknown messages shape, no such
    /// agent, no transport registered) are returned as `Err`; an agent
    /// transport that itself fails still yields an `Ok` `DispatchResponse`
    /// carrying a synthetic error message.
    pub async fn dispatch(
        &self,
        agent_identifier: Option<&str>,
        request: DispatchRequest,
    ) -> Result<DispatchResponse, DispatchError> {
        if request.messages.is_empty() {
            return Err(DispatchError::EmptyMessages);
        }
        let identifier = self.resolve_agent(agent_identifier)?;
        let config = &self.agents.agents[identifier];
        let transport = self
            .transports
            .get(identifier)
            .ok_or_else(|| DispatchError::NoTransportForAgent(identifier.to_string()))?;

        let prompt = self.compose_prompt(&config.prompt);
        let agent_summary = AgentSummary {
            identifier: identifier.to_string(),
            name: config.name.clone(),
            description: config.description.clone(),
            prompt: Some(prompt),
        };

        let tools = match self.router.tools_list().await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!(error = %e, "tool aggregation failed, dispatching without tools");
                Vec::new()
            }
        };

        let agent_request = AgentRequest {
            agent: agent_summary,
            tools,
            servers: self.server_summaries(),
            messages: request.messages,
        };

        match transport.dispatch(agent_request).await {
            Ok(resp) => Ok(DispatchResponse::from_agent_response(identifier, resp)),
            Err(e) => Ok(Self::synthetic_error_response(identifier, &e)),
        }
    }

    fn synthetic_error_response(sender: &str, error: &AgentTransportError) -> DispatchResponse {
        DispatchResponse::synthetic_error(sender, &error.to_string())
    }
}
