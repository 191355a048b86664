//! Agent transports: the common `dispatch` contract and its HTTP,
//! SSE, stdio (pool), and direct/openai implementations.

pub mod direct_openai;
pub mod http;
pub mod sse;
pub mod stdio_pool;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AgentRequest, AgentResponse};

#[derive(Debug, Error)]
pub enum AgentTransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("agent returned an invalid response: {0}")]
    InvalidAgentResponse(String),
    #[error("no SSE channel registered for agent {0}")]
    AgentDisconnected(String),
    #[error("timed out waiting for agent response")]
    Timeout,
    #[error(transparent)]
    Pool(#[from] stdio_pool::PoolError),
    #[error("direct agent transport failed: {0}")]
    Direct(String),
}

#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse, AgentTransportError>;
}
