//! Shared data model: messages, tool definitions, and the agent request/
//! response envelope exchanged between the dispatch service and agent
//! transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

impl Message {
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content } => content,
        }
    }
}

/// A tool as presented to an agent: the mangled, agent-facing name, a
/// description, and a JSON-schema-shaped parameter description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Summary of a configured server, as surfaced by the internal tools service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSummary {
    pub identifier: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    pub identifier: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// The request an agent transport receives: the resolved agent identity, the
/// current aggregated tool list, known servers, and the conversation so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub agent: AgentSummary,
    pub tools: Vec<ToolDefinition>,
    pub servers: Vec<ServerSummary>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentResponseType {
    Text,
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_token: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_tools: Option<u64>,
}

/// What an agent transport produces for one dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "type")]
    pub kind: AgentResponseType,
    pub content: Option<String>,
    pub metadata: AgentResponseMetadata,
}

impl AgentResponse {
    pub fn text(content: impl Into<String>, used_token: u64, used_tools: u64) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            kind: AgentResponseType::Text,
            content: Some(content.into()),
            metadata: AgentResponseMetadata {
                used_token: Some(used_token),
                used_tools: Some(used_tools),
            },
        }
    }

    /// True when the shape is missing fields required on every
    /// response (`type`/`metadata` are structurally required by the type
    /// system here; this validates the logical invariant that `content` is
    /// present whenever `kind` is `Text`).
    pub fn is_valid(&self) -> bool {
        match self.kind {
            AgentResponseType::Text => self.content.is_some(),
            AgentResponseType::Null => true,
        }
    }
}

/// Inbound request to `/dispatch[/:agentId]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub messages: Vec<Message>,
}

/// What `/dispatch` and the webhook path return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub sender: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "type")]
    pub kind: AgentResponseType,
    pub content: Option<String>,
    pub metadata: AgentResponseMetadata,
}

impl DispatchResponse {
    pub fn from_agent_response(sender: impl Into<String>, resp: AgentResponse) -> Self {
        Self {
            sender: sender.into(),
            timestamp: resp.timestamp,
            kind: resp.kind,
            content: resp.content,
            metadata: resp.metadata,
        }
    }

    pub fn synthetic_error(sender: impl Into<String>, message: &str) -> Self {
        Self {
            sender: sender.into(),
            timestamp: chrono::Utc::now(),
            kind: AgentResponseType::Text,
            content: Some(format!(
                "Sorry, I encountered an error while processing your request: {message}"
            )),
            metadata: AgentResponseMetadata {
                used_token: Some(0),
                used_tools: Some(0),
            },
        }
    }
}
