//! HTTP server for Cubicler (axum): `/health`, `/agents`, `/dispatch`,
//! `/mcp`, and `/webhook` on top of [`cubicler_core`].
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod handlers;
mod response;
mod state;
#[cfg(test)]
mod test_support;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

pub use app::router;
pub use state::AppState;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Serves `state` on an existing listener. Tests bind `127.0.0.1:0` and pass
/// the listener in directly to learn the assigned port. `shutdown` resolves
/// when the server should stop accepting new connections.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: std::sync::Arc<AppState>,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("HTTP server listening on http://{}", addr);

    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await?;
    info!("HTTP server shut down");
    Ok(())
}

/// Binds `addr` (default `127.0.0.1:8080`) and serves `state` until `shutdown`
/// resolves.
pub async fn run_serve(
    addr: Option<&str>,
    state: std::sync::Arc<AppState>,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_HTTP_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, state, shutdown).await
}
