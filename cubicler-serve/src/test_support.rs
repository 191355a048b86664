//! Shared fixtures for handler unit tests.

#![cfg(test)]

use std::collections::HashMap;
use std::sync::Arc;

use cubicler_core::config_doc::{AgentsConfig, ProvidersConfig, WebhooksConfig};
use cubicler_core::mcp::bridge::SseRegistry;
use cubicler_core::provider::builtin::BuiltinToolsProvider;
use cubicler_core::{DispatchService, HealthService, McpRouter, WebhookService};

use crate::state::AppState;

pub fn test_state() -> Arc<AppState> {
    let router = Arc::new(McpRouter::new(vec![Arc::new(BuiltinToolsProvider::new(
        vec![],
        vec![],
    ))]));
    let agents = AgentsConfig::default();
    let providers = ProvidersConfig::default();
    let dispatch = Arc::new(DispatchService::new(
        agents.clone(),
        providers.clone(),
        router.clone(),
        HashMap::new(),
    ));
    let health = Arc::new(HealthService::new(agents.clone(), providers, router.clone()));
    let webhook = Arc::new(WebhookService::new(WebhooksConfig::default(), dispatch.clone()));
    Arc::new(AppState {
        dispatch,
        webhook,
        health,
        router,
        agents,
        sse: Arc::new(SseRegistry::new()),
    })
}
