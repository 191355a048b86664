//! REST provider: treats each configured endpoint as a tool. Path variables,
//! a `query` object, and a `payload` object are merged into one parameter
//! schema; execution substitutes path params, builds a query string, sends
//! the JSON payload, injects a JWT when configured, and applies the
//! endpoint's response transform.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{ProviderError, ToolsProvider};
use crate::codec;
use crate::config_doc::{RestEndpointConfig, RestServerConfig};
use crate::jwt::JwtTokenCache;
use crate::model::ToolDefinition;
use crate::transform;

static PATH_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

pub struct RestProvider {
    server: RestServerConfig,
    jwt_cache: JwtTokenCache,
}

impl RestProvider {
    pub fn new(server: RestServerConfig) -> Self {
        Self {
            server,
            jwt_cache: JwtTokenCache::new(),
        }
    }

    fn path_vars(path: &str) -> Vec<String> {
        PATH_VAR_RE
            .captures_iter(path)
            .map(|c| c[1].to_string())
            .collect()
    }

    fn tool_name(&self, endpoint_name: &str) -> String {
        codec::encode(&self.server.identifier, &self.server.url, endpoint_name)
    }

    fn endpoint_for_hash_and_function<'a>(
        &'a self,
        hash: &str,
        function: &str,
    ) -> Option<(&'a str, &'a RestEndpointConfig)> {
        if hash != codec::hash6(&self.server.identifier, &self.server.url) {
            return None;
        }
        self.server
            .endpoints
            .iter()
            .find(|(name, _)| codec::snake_case(name) == function)
            .map(|(name, ep)| (name.as_str(), ep))
    }

    fn build_parameters(&self, endpoint: &RestEndpointConfig) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for var in Self::path_vars(&endpoint.path) {
            properties.insert(var.clone(), json!({"type": "string"}));
            required.push(Value::String(var));
        }
        if let Some(query) = &endpoint.parameters {
            properties.insert("query".to_string(), query.clone());
        }
        if let Some(payload) = &endpoint.payload {
            properties.insert("payload".to_string(), payload.clone());
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    async fn execute(
        &self,
        endpoint: &RestEndpointConfig,
        args: &Value,
    ) -> Result<Value, ProviderError> {
        let mut path = endpoint.path.clone();
        for var in Self::path_vars(&endpoint.path) {
            let value = args
                .get(&var)
                .map(value_as_path_segment)
                .unwrap_or_default();
            path = path.replace(&format!("{{{var}}}"), &value);
        }

        let mut url = format!("{}{}", self.server.url.trim_end_matches('/'), path);
        if let Some(query) = args.get("query").and_then(Value::as_object) {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, value_as_path_segment(v)))
                .collect();
            if !pairs.is_empty() {
                url.push('?');
                url.push_str(&pairs.join("&"));
            }
        }

        let client = reqwest::Client::new();
        let mut builder = client.request(endpoint.method.as_reqwest(), &url);
        for (k, v) in self.server.default_headers.iter().chain(endpoint.headers.iter()) {
            builder = builder.header(k, v);
        }
        if let Some(auth) = &self.server.auth {
            let token = self.jwt_cache.bearer_token(&self.server.identifier, &auth.jwt).await?;
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if endpoint.method.accepts_body() {
            if let Some(payload) = args.get("payload") {
                builder = builder.json(payload);
            }
        }

        let resp = builder.send().await?;
        if !resp.status().is_success() {
            return Err(ProviderError::UpstreamStatus(resp.status().as_u16()));
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        match &endpoint.response_transform {
            Some(rules) => Ok(transform::apply(&body, rules)?),
            None => Ok(body),
        }
    }
}

fn value_as_path_segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ToolsProvider for RestProvider {
    fn identifier(&self) -> &str {
        &self.server.identifier
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn tools_list(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self
            .server
            .endpoints
            .iter()
            .map(|(name, endpoint)| ToolDefinition {
                name: self.tool_name(name),
                description: format!("{} {}", endpoint.method.as_reqwest(), endpoint.path),
                parameters: self.build_parameters(endpoint),
            })
            .collect())
    }

    async fn tools_call(&self, name: &str, args: Value) -> Result<Value, ProviderError> {
        let (hash, function) = codec::decode(name)?;
        let (_, endpoint) = self
            .endpoint_for_hash_and_function(hash, function)
            .ok_or_else(|| ProviderError::UnknownTool(name.to_string()))?;
        self.execute(endpoint, &args).await
    }

    fn can_handle_request(&self, name: &str) -> bool {
        match codec::decode(name) {
            Ok((hash, function)) => self.endpoint_for_hash_and_function(hash, function).is_some(),
            Err(_) => false,
        }
    }
}
