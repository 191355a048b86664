//! # Cubicler core
//!
//! Core logic for Cubicler: an orchestration gateway that sits between
//! conversational agents and the MCP/REST tool providers they call. This
//! crate has no HTTP surface of its own — see `cubicler-serve` for the axum
//! router and `cubicler-cli` for the binary composition root.
//!
//! ## Main modules
//!
//! - [`codec`]: the function-name codec — mangles `(server, function)` pairs
//!   into a single hashed, snake_case tool name agents see, and back.
//! - [`model`]: the shared data model (`Message`, `ToolDefinition`,
//!   `AgentRequest`/`AgentResponse`, `DispatchRequest`/`DispatchResponse`).
//! - [`config_doc`]: typed loaders for the three configuration documents
//!   (agents, providers, webhooks), with TTL-cached fetch from file or URL.
//! - [`transform`]: the payload transformer (`map`/`template`/`date_format`/
//!   `remove`) used by REST response transforms and webhook payload
//!   transforms.
//! - [`provider`]: [`provider::ToolsProvider`] and its built-in, MCP, and
//!   REST implementations, plus the MCP transport layer
//!   ([`provider::transport`]).
//! - [`mcp`]: the JSON-RPC router ([`mcp::router::McpRouter`]) and the
//!   MCP-over-SSE bridge ([`mcp::bridge`]).
//! - [`agent`]: agent transports — HTTP, SSE, stdio worker pool, and
//!   direct/openai.
//! - [`jwt`]: bearer token production for REST provider auth.
//! - [`dispatch`]: resolves an agent, composes its prompt, aggregates tools,
//!   and invokes its transport.
//! - [`webhook`]: authenticates and routes inbound webhook calls to dispatch.
//! - [`health`]: aggregate health reporting.
//! - [`error`]: [`error::CubiclerError`], the error type the HTTP surface
//!   maps to status codes.

pub mod agent;
pub mod codec;
pub mod config_doc;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod jwt;
pub mod mcp;
pub mod model;
pub mod provider;
pub mod transform;
pub mod webhook;

pub use codec::{decode, encode, hash6, snake_case, NameError};
pub use dispatch::{DispatchError, DispatchService};
pub use error::{CubiclerError, NotFoundKind};
pub use health::{HealthReport, HealthService, HealthStatus};
pub use mcp::router::{McpRouter, RouterError};
pub use model::{
    AgentRequest, AgentResponse, AgentResponseMetadata, AgentResponseType, AgentSummary,
    DispatchRequest, DispatchResponse, Message, ServerSummary, ToolDefinition,
};
pub use provider::{ProviderError, ToolsProvider};
pub use webhook::{WebhookError, WebhookService};

/// Initializes tracing from `RUST_LOG` so unit tests across `src/**` can
/// print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
