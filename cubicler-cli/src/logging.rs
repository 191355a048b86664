//! Tracing subscriber wiring: env-filtered stderr output plus an optional
//! rolling file sink when `CUBICLER_LOG_DIR` is set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::log_format::TextWithSpanIds;

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(TextWithSpanIds::new())
        .with_writer(std::io::stderr)
        .with_filter(filter());

    match std::env::var("CUBICLER_LOG_DIR") {
        Ok(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "cubicler.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // Leaked deliberately: the writer thread this guard owns must
            // outlive every tracing call for the rest of the process.
            Box::leak(Box::new(guard));
            let file_layer = tracing_subscriber::fmt::layer()
                .event_format(TextWithSpanIds::new())
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
        }
        Err(_) => {
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
        }
    }
    Ok(())
}
