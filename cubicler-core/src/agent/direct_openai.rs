//! Direct/openai agent transport: an in-process loop that builds OpenAI
//! function-calling schemas from the current tool list, invokes the MCP
//! router in-process on tool calls, and returns the final content once the
//! model stops calling tools (or a max-iteration cap is hit).

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;

use super::{AgentTransport, AgentTransportError};
use crate::mcp::jsonrpc::{MCPRequest, RequestId};
use crate::mcp::router::McpRouter;
use crate::model::{AgentResponse, AgentResponseMetadata, AgentRequest, Message};

pub struct DirectOpenAiTransport {
    client: Client<OpenAIConfig>,
    model: String,
    max_tool_iterations: u32,
    router: Arc<McpRouter>,
}

impl DirectOpenAiTransport {
    pub fn new(api_key: Option<String>, model: String, max_tool_iterations: u32, router: Arc<McpRouter>) -> Self {
        let config = match api_key {
            Some(key) => OpenAIConfig::new().with_api_key(key),
            None => OpenAIConfig::new(),
        };
        Self {
            client: Client::with_config(config),
            model,
            max_tool_iterations,
            router,
        }
    }

    fn to_openai_tools(
        request: &AgentRequest,
    ) -> Result<Vec<async_openai::types::ChatCompletionTool>, AgentTransportError> {
        request
            .tools
            .iter()
            .map(|t| {
                let function = FunctionObjectArgs::default()
                    .name(t.name.clone())
                    .description(t.description.clone())
                    .parameters(t.parameters.clone())
                    .build()
                    .map_err(|e| AgentTransportError::Direct(e.to_string()))?;
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()
                    .map_err(|e| AgentTransportError::Direct(e.to_string()))
            })
            .collect()
    }

    fn to_openai_messages(
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentTransportError> {
        let mut out = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
        )];
        for message in messages {
            let converted = match message {
                Message::System { content } => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(content.clone())
                        .build()
                        .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
                ),
                Message::User { content } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(content.clone())
                        .build()
                        .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
                ),
                Message::Assistant { content } => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content.clone())
                        .build()
                        .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
                ),
            };
            out.push(converted);
        }
        Ok(out)
    }

    async fn invoke_tool(&self, call: &ChatCompletionMessageToolCall) -> String {
        let args: serde_json::Value =
            serde_json::from_str(&call.function.arguments).unwrap_or(serde_json::json!({}));
        let request = MCPRequest::new(
            RequestId::String(call.id.clone()),
            "tools/call",
            Some(serde_json::json!({"name": call.function.name, "arguments": args})),
        );
        let response = self.router.handle(request).await;
        match response.result {
            Some(result) => result.to_string(),
            None => response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "tool call failed".to_string()),
        }
    }
}

#[async_trait]
impl AgentTransport for DirectOpenAiTransport {
    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse, AgentTransportError> {
        let system_prompt = request
            .agent
            .prompt
            .clone()
            .unwrap_or_else(|| "You are a helpful AI assistant powered by Cubicler.".to_string());
        let tools = Self::to_openai_tools(&request)?;
        let mut messages = Self::to_openai_messages(&system_prompt, &request.messages)?;

        let mut used_tools = 0u64;
        let mut used_tokens = 0u64;

        for _ in 0..self.max_tool_iterations {
            let mut builder = CreateChatCompletionRequestArgs::default();
            builder.model(&self.model).messages(messages.clone());
            if !tools.is_empty() {
                builder.tools(tools.clone());
            }
            let req = builder
                .build()
                .map_err(|e| AgentTransportError::Direct(e.to_string()))?;

            let resp = self
                .client
                .chat()
                .create(req)
                .await
                .map_err(|e| AgentTransportError::Direct(e.to_string()))?;

            if let Some(usage) = &resp.usage {
                used_tokens += usage.total_tokens as u64;
            }

            let Some(choice) = resp.choices.into_iter().next() else {
                return Err(AgentTransportError::Direct("no choices returned".to_string()));
            };
            let message = choice.message;

            if let Some(tool_calls) = &message.tool_calls {
                if !tool_calls.is_empty() {
                    messages.push(ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .tool_calls(tool_calls.clone())
                            .build()
                            .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
                    ));
                    for call in tool_calls {
                        let result = self.invoke_tool(call).await;
                        used_tools += 1;
                        messages.push(ChatCompletionRequestMessage::Tool(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(call.id.clone())
                                .content(result)
                                .build()
                                .map_err(|e| AgentTransportError::Direct(e.to_string()))?,
                        ));
                    }
                    continue;
                }
            }

            return Ok(AgentResponse {
                timestamp: chrono::Utc::now(),
                kind: crate::model::AgentResponseType::Text,
                content: message.content,
                metadata: AgentResponseMetadata {
                    used_token: Some(used_tokens),
                    used_tools: Some(used_tools),
                },
            });
        }

        Err(AgentTransportError::Direct(
            "max tool-call iterations exceeded".to_string(),
        ))
    }
}
