//! Shared application state handed to every handler.

use std::sync::Arc;

use cubicler_core::config_doc::AgentsConfig;
use cubicler_core::mcp::bridge::SseRegistry;
use cubicler_core::{DispatchService, HealthService, McpRouter, WebhookService};

/// Everything a handler needs, built once by the composition root and shared
/// read-only (or behind internal interior mutability) across requests.
pub struct AppState {
    pub dispatch: Arc<DispatchService>,
    pub webhook: Arc<WebhookService>,
    pub health: Arc<HealthService>,
    pub router: Arc<McpRouter>,
    pub agents: AgentsConfig,
    pub sse: Arc<SseRegistry>,
}
