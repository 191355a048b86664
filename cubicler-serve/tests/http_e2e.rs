//! End-to-end HTTP tests: spin up the real axum app on a random port and hit
//! it with `reqwest`.

use std::collections::HashMap;
use std::sync::Arc;

use cubicler_core::config_doc::{AgentsConfig, ProvidersConfig, WebhooksConfig};
use cubicler_core::mcp::bridge::SseRegistry;
use cubicler_core::provider::builtin::BuiltinToolsProvider;
use cubicler_core::{DispatchService, HealthService, McpRouter, WebhookService};
use cubicler_serve::AppState;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn spawn() -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
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
    let state = Arc::new(AppState {
        dispatch,
        webhook,
        health,
        router,
        agents,
        sse: Arc::new(SseRegistry::new()),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        cubicler_serve::run_serve_on_listener(listener, state, rx)
            .await
            .unwrap();
    });
    (format!("http://{addr}"), tx, handle)
}

#[tokio::test]
async fn health_reports_zero_configured_agents_with_empty_config() {
    let (base, shutdown, handle) = spawn().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["agents"], 0);
    let _ = shutdown.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn agents_list_is_empty_with_no_agents_configured() {
    let (base, shutdown, handle) = spawn().await;
    let resp = reqwest::get(format!("{base}/agents")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 0);
    assert!(body["agents"].as_array().unwrap().is_empty());
    let _ = shutdown.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn dispatch_without_any_configured_agent_is_a_server_error() {
    let (base, shutdown, handle) = spawn().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/dispatch"))
        .json(&serde_json::json!({ "messages": [{"role": "user", "content": "hi"}] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let _ = shutdown.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn mcp_tools_list_includes_builtins() {
    let (base, shutdown, handle) = spawn().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/mcp"))
        .json(&serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    let tools = body["result"]["tools"].as_array().unwrap();
    assert!(!tools.is_empty());
    let _ = shutdown.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn webhook_unknown_identifier_is_not_found() {
    let (base, shutdown, handle) = spawn().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/webhook/nope"))
        .json(&serde_json::json!({ "messages": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let _ = shutdown.send(());
    handle.await.unwrap();
}
