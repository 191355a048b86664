//! Axum router: wires every route to its handler and state.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{agents, dispatch, health, mcp, webhook};
use crate::state::AppState;

fn cors_enabled() -> bool {
    matches!(
        std::env::var("ENABLE_CORS").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(health::health))
        .route("/agents", get(agents::list_agents))
        .route("/dispatch", post(dispatch::dispatch_default))
        .route("/dispatch/:agent_id", post(dispatch::dispatch_agent))
        .route("/mcp", post(mcp::handle))
        .route("/mcp/sse", get(mcp::sse_stream))
        .route("/webhook/:identifier", post(webhook::handle))
        .with_state(state);

    if cors_enabled() {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}
