//! SSE agent transport: writes the `AgentRequest` to a previously-registered
//! agent channel and awaits a correlated response posted back on a separate
//! inbound endpoint.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{AgentTransport, AgentTransportError};
use crate::model::{AgentRequest, AgentResponse};

/// Registry of live agent SSE channels keyed by agent identifier, plus the
/// pending-response slots keyed by the dispatcher-chosen correlation id.
pub struct SseAgentRegistry {
    channels: DashMap<String, mpsc::Sender<String>>,
    pending: DashMap<String, oneshot::Sender<AgentResponse>>,
}

impl SseAgentRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    pub fn register(&self, agent_identifier: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);
        self.channels.insert(agent_identifier.to_string(), tx);
        rx
    }

    pub fn unregister(&self, agent_identifier: &str) {
        self.channels.remove(agent_identifier);
    }

    /// Called by the inbound endpoint an agent POSTs its response back to.
    pub fn complete(&self, request_id: &str, response: AgentResponse) -> bool {
        if let Some((_, sender)) = self.pending.remove(request_id) {
            sender.send(response).is_ok()
        } else {
            false
        }
    }
}

impl Default for SseAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SseAgentTransport {
    agent_identifier: String,
    registry: Arc<SseAgentRegistry>,
}

impl SseAgentTransport {
    pub fn new(agent_identifier: String, registry: Arc<SseAgentRegistry>) -> Self {
        Self {
            agent_identifier,
            registry,
        }
    }
}

#[async_trait]
impl AgentTransport for SseAgentTransport {
    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse, AgentTransportError> {
        let Some(channel) = self.registry.channels.get(&self.agent_identifier).map(|c| c.clone())
        else {
            return Err(AgentTransportError::AgentDisconnected(
                self.agent_identifier.clone(),
            ));
        };

        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.registry.pending.insert(request_id.clone(), tx);

        let envelope = serde_json::json!({"requestId": request_id, "request": request});
        let frame = format!("data: {}\n\n", envelope);
        if channel.send(frame).await.is_err() {
            self.registry.pending.remove(&request_id);
            return Err(AgentTransportError::AgentDisconnected(
                self.agent_identifier.clone(),
            ));
        }

        match tokio::time::timeout(Duration::from_secs(60), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            _ => {
                self.registry.pending.remove(&request_id);
                Err(AgentTransportError::Timeout)
            }
        }
    }
}
