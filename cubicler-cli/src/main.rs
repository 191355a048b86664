//! Cubicler CLI: the composition root binary. Loads configuration, builds
//! every provider/agent transport/service from the three config documents,
//! and serves them over HTTP until interrupted.

mod composition;
mod log_format;
mod logging;

use clap::Parser;
use tokio::sync::oneshot;

#[derive(Parser, Debug)]
#[command(name = "cubicler")]
#[command(about = "Cubicler: orchestration gateway between agents and MCP/REST tool providers")]
struct Args {
    /// HTTP listen address (default 127.0.0.1:8080)
    #[arg(long, value_name = "ADDR", env = "CUBICLER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("cubicler", None::<&std::path::Path>).ok();
    logging::init()?;

    let args = Args::parse();

    let built = composition::build().await?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    cubicler_serve::run_serve(args.addr.as_deref(), built.state, shutdown_rx).await?;
    Ok(())
}
