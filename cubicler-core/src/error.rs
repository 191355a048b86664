//! Top-level error taxonomy. Each subsystem defines its own
//! `thiserror` enum (`ConfigError`, `TransportError`, `ProviderError`,
//! `RouterError`, `DispatchError`, `WebhookError`, `PoolError`, `JwtError`);
//! this module aggregates them into the one type the HTTP surface maps to a
//! status code, via `#[from]` conversions kept at each error's definition
//! site.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Agent,
    Webhook,
    Server,
    Endpoint,
    Tool,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotFoundKind::Agent => "agent",
            NotFoundKind::Webhook => "webhook",
            NotFoundKind::Server => "server",
            NotFoundKind::Endpoint => "endpoint",
            NotFoundKind::Tool => "tool",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum CubiclerError {
    #[error("config load failed: {0}")]
    ConfigLoad(#[from] crate::config_doc::ConfigError),

    #[error("{kind} not found: {key}")]
    NotFound { kind: NotFoundKind, key: String },

    #[error(transparent)]
    InvalidName(#[from] crate::codec::NameError),

    #[error(transparent)]
    Transport(#[from] crate::provider::transport::TransportError),

    #[error(transparent)]
    Provider(#[from] crate::provider::ProviderError),

    #[error(transparent)]
    Router(#[from] crate::mcp::router::RouterError),

    #[error(transparent)]
    Webhook(#[from] crate::webhook::WebhookError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl CubiclerError {
    pub fn not_found(kind: NotFoundKind, key: impl Into<String>) -> Self {
        CubiclerError::NotFound {
            kind,
            key: key.into(),
        }
    }
}
