//! The three configuration documents: agents, MCP/REST providers,
//! and webhooks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").unwrap());

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("identifier {0:?} must be 1-32 chars of [A-Za-z0-9_-]")]
    InvalidIdentifier(String),
    #[error("{0} must declare at least one entry")]
    Empty(&'static str),
}

pub fn validate_identifier(id: &str) -> Result<(), SchemaError> {
    if IDENTIFIER_RE.is_match(id) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(id.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_workers() -> usize {
    4
}
fn default_acquire_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum AgentTransportConfig {
    Http {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Sse {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        pool: PoolConfig,
    },
    Direct {
        provider: String,
        #[serde(default)]
        api_key: Option<String>,
        model: String,
        #[serde(default = "default_max_tool_iterations")]
        max_tool_iterations: u32,
    },
}

fn default_max_tool_iterations() -> u32 {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub identifier: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub transport: AgentTransportConfig,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentsConfig {
    #[serde(default)]
    pub base_prompt: Option<String>,
    #[serde(default)]
    pub default_prompt: Option<String>,
    pub agents: HashMap<String, AgentConfig>,
}

impl AgentsConfig {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.agents.is_empty() {
            return Err(SchemaError::Empty("agents"));
        }
        for (key, agent) in &self.agents {
            validate_identifier(key)?;
            validate_identifier(&agent.identifier)?;
        }
        Ok(())
    }

    pub fn first_identifier(&self) -> Option<&str> {
        self.agents.keys().next().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpServerTransportConfig {
    Http {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Sse {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    Auto {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

/// `auto` is the implicit transport: a document with a `url` and no
/// `transport` field is `Auto`, not a deserialization error. Every other
/// transport still requires its explicit tag.
impl<'de> Deserialize<'de> for McpServerTransportConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(tag = "transport", rename_all = "snake_case")]
        enum Tagged {
            Http {
                url: String,
                #[serde(default)]
                headers: HashMap<String, String>,
            },
            Sse {
                url: String,
                #[serde(default)]
                headers: HashMap<String, String>,
            },
            Stdio {
                command: String,
                #[serde(default)]
                args: Vec<String>,
                #[serde(default)]
                env: HashMap<String, String>,
            },
            Auto {
                url: String,
                #[serde(default)]
                headers: HashMap<String, String>,
            },
        }

        let mut value = Value::deserialize(deserializer)?;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("transport").or_insert_with(|| Value::String("auto".to_string()));
        }
        let tagged = Tagged::deserialize(value).map_err(serde::de::Error::custom)?;
        Ok(match tagged {
            Tagged::Http { url, headers } => McpServerTransportConfig::Http { url, headers },
            Tagged::Sse { url, headers } => McpServerTransportConfig::Sse { url, headers },
            Tagged::Stdio { command, args, env } => {
                McpServerTransportConfig::Stdio { command, args, env }
            }
            Tagged::Auto { url, headers } => McpServerTransportConfig::Auto { url, headers },
        })
    }
}

impl McpServerTransportConfig {
    /// The `primaryString` used in the function-name hash: `url` for
    /// URL-based transports, `command` for stdio.
    pub fn primary_string(&self) -> &str {
        match self {
            McpServerTransportConfig::Http { url, .. }
            | McpServerTransportConfig::Sse { url, .. }
            | McpServerTransportConfig::Auto { url, .. } => url,
            McpServerTransportConfig::Stdio { command, .. } => command,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    pub identifier: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub transport: McpServerTransportConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }

    pub fn accepts_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestEndpointConfig {
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub response_transform: Option<Vec<crate::transform::TransformRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum JwtAuthConfig {
    Static {
        token: String,
    },
    Oauth2ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default = "default_refresh_threshold")]
        refresh_threshold: u64,
    },
}

fn default_refresh_threshold() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestAuthConfig {
    pub jwt: JwtAuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestServerConfig {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
    #[serde(default)]
    pub auth: Option<RestAuthConfig>,
    pub endpoints: HashMap<String, RestEndpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default)]
    pub mcp_servers: Vec<McpServerConfig>,
    #[serde(default)]
    pub rest_servers: Vec<RestServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WebhookAuthConfig {
    Signature { secret: String },
    Bearer { token: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub auth: Option<WebhookAuthConfig>,
    pub allowed_agents: Vec<String>,
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub payload_transform: Option<Vec<crate::transform::TransformRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhooksConfig {
    #[serde(flatten)]
    pub webhooks: HashMap<String, WebhookConfig>,
}

impl WebhooksConfig {
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (key, webhook) in &self.webhooks {
            validate_identifier(key)?;
            if webhook.allowed_agents.is_empty() {
                return Err(SchemaError::Empty("allowedAgents"));
            }
        }
        Ok(())
    }
}
